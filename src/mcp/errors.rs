pub const FILE_NOT_FOUND: &str = "file_not_found";
pub const INVALID_DOCUMENT: &str = "invalid_document";
pub const INDEX_OUT_OF_RANGE: &str = "index_out_of_range";
pub const INVALID_ARGUMENT: &str = "invalid_argument";
pub const IO_FAILURE: &str = "io_failure";
