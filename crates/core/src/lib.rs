pub mod annotation {
    pub mod domain {
        pub mod frame_annotator;
    }
    pub mod infrastructure;
}

pub mod identity {
    pub mod domain {
        pub mod id_map;
    }
    pub mod infrastructure;
}

pub mod labels {
    pub mod domain {
        pub mod detection_record;
        pub mod label_artifact;
        pub mod label_store;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod compose_subject_videos_use_case;
    pub mod output_streams;
    pub mod pipeline_logger;
    pub mod rewrite_labels_use_case;
    pub mod run_batch_use_case;

    #[cfg(test)]
    pub(crate) mod test_support;
}

pub mod shared {
    pub mod config;
    pub mod constants;
    pub mod error;
    pub mod frame;
    pub mod region;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod video_backend;
        pub mod video_reader;
        pub mod video_writer;
    }
    pub mod infrastructure;
}
