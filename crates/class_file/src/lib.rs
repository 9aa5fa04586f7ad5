// https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html

#[macro_use]
mod options;
#[macro_use]
pub mod constant_pool;
mod access_flags;
pub mod attributes;
mod class_file;
mod error;
mod mutf8;
mod parser;
mod record;
mod writer;

pub use self::class_file::{ClassFile, FieldInfo, MemberInfo, MethodInfo, CLASS_MAGIC};
pub use access_flags::AccessFlags;
pub use attributes::{Attribute, AttributeInfo, Attributes};
pub use constant_pool::{ConstantPool, CpInfo, CpTag};
pub use error::{ClassFileError, ErrorKind};
pub use mutf8::MUtf8;
pub use options::{ReadOptions, WriteOptions};
pub use parser::{Parser, MAX_NESTING};
pub use record::Record;
pub use writer::Writer;

pub type Result<T, E = ClassFileError> = std::result::Result<T, E>;
