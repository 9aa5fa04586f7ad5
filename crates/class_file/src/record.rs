use std::io::{Read, Write};

use crate::{ConstantPool, Parser, Result, Writer};

/// A structure nested inside a class file.
///
/// `byte_length` is computed from the current content and always equals the
/// number of bytes `write_to` emits.
pub trait Record: Sized {
    fn read_from<R: Read>(parser: &mut Parser<R>, constant_pool: &ConstantPool) -> Result<Self>;

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()>;

    fn byte_length(&self) -> u32;
}

/// Encoded size of a table with a `u2` count.
pub(crate) fn table_length<T: Record>(items: &[T]) -> u32 {
    2 + items_length(items)
}

pub(crate) fn items_length<T: Record>(items: &[T]) -> u32 {
    items.iter().map(Record::byte_length).sum()
}

impl Record for u16 {
    fn read_from<R: Read>(parser: &mut Parser<R>, _: &ConstantPool) -> Result<Self> {
        parser.read_u16()
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(*self)
    }

    fn byte_length(&self) -> u32 {
        2
    }
}
