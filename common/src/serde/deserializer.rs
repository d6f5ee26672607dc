use std::{
    borrow::Cow,
    io::{self, ErrorKind, Read, Seek, SeekFrom},
};

/// Sequential byte source for the mesh parsers. Reads past the end of the
/// input return short (or empty) buffers from [`Deserializer::read_bytes`]
/// and an [`ErrorKind::UnexpectedEof`] error from the fixed size readers.
#[rustfmt::skip]
pub trait Deserializer {
    fn pos(&mut self) -> io::Result<usize>;
    fn size(&mut self) -> io::Result<usize>;
    fn jump_to(&mut self, pos: usize) -> io::Result<()>;
    fn read_bytes(&mut self, length: usize) -> io::Result<Cow<'_, [u8]>>;

    fn advance_by(&mut self, amount: usize) -> io::Result<()> {
        let pos = self.pos()?;
        self.jump_to(pos + amount)
    }

    fn read_array<const LENGTH: usize>(&mut self) -> io::Result<[u8; LENGTH]> {
        let bytes = self.read_bytes(LENGTH)?;
        <[u8; LENGTH]>::try_from(bytes.as_ref())
            .map_err(|_| io::Error::new(ErrorKind::UnexpectedEof, "unexpected end of input"))
    }

    fn read_u8(&mut self) -> io::Result<u8> { Ok(self.read_array::<1>()?[0]) }
    fn read_u16_le(&mut self) -> io::Result<u16> { Ok(u16::from_le_bytes(self.read_array()?)) }
    fn read_u32_le(&mut self) -> io::Result<u32> { Ok(u32::from_le_bytes(self.read_array()?)) }
    fn read_f32_le(&mut self) -> io::Result<f32> { Ok(f32::from_le_bytes(self.read_array()?)) }
}

pub struct SliceDeserializer<'a> {
    buffer: &'a [u8],
    offset: usize,
}

pub struct ReaderDeserializer<T: Read + Seek> {
    reader: T,
}

impl<'a> SliceDeserializer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            buffer: data,
            offset: 0,
        }
    }
}

impl<T: Read + Seek> ReaderDeserializer<T> {
    pub fn new(reader: T) -> Self {
        Self { reader }
    }
}

impl Deserializer for SliceDeserializer<'_> {
    fn pos(&mut self) -> io::Result<usize> {
        Ok(self.offset)
    }

    fn size(&mut self) -> io::Result<usize> {
        Ok(self.buffer.len())
    }

    fn jump_to(&mut self, pos: usize) -> io::Result<()> {
        self.offset = pos;
        Ok(())
    }

    fn read_bytes(&mut self, length: usize) -> io::Result<Cow<'_, [u8]>> {
        let start = self.offset.min(self.buffer.len());
        let end = start.saturating_add(length).min(self.buffer.len());
        self.offset = end;
        Ok(Cow::Borrowed(&self.buffer[start..end]))
    }
}

impl<T: Read + Seek> Deserializer for ReaderDeserializer<T> {
    fn pos(&mut self) -> io::Result<usize> {
        Ok(self.reader.stream_position()? as usize)
    }

    fn size(&mut self) -> io::Result<usize> {
        let pos = self.reader.stream_position()?;
        let size = self.reader.seek(SeekFrom::End(0))?;
        self.reader.seek(SeekFrom::Start(pos))?;
        Ok(size as usize)
    }

    fn jump_to(&mut self, pos: usize) -> io::Result<()> {
        self.reader.seek(SeekFrom::Start(pos as u64))?;
        Ok(())
    }

    fn read_bytes(&mut self, length: usize) -> io::Result<Cow<'_, [u8]>> {
        let mut buf = Vec::with_capacity(length);
        (&mut self.reader).take(length as u64).read_to_end(&mut buf)?;
        Ok(Cow::Owned(buf))
    }
}
