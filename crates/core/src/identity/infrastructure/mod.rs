pub mod csv_table_reader;
