pub mod daf_file;
pub mod daf_header;
pub mod directory;
pub mod ephemeris_record;
pub mod naif_ids;
pub mod naif_type;
pub mod summary_record;
