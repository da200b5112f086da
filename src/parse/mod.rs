pub mod live_scan;
pub mod token_parser;

pub use live_scan::{TagScan, scan_completed_tags};
pub use token_parser::{ParsedInput, parse_task_input, strip_tag_tokens};
