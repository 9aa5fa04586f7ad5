//! Reading, editing and writing JVM class files.
//!
//! The codec itself lives in the `clasp-class_file` workspace member.

pub use clasp_class_file as class_file;
