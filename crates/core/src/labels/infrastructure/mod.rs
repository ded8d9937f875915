pub mod fs_label_store;
