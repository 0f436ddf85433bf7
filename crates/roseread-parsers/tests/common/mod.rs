//! Little-endian byte builder shared by the integration tests

#![allow(dead_code)]

#[derive(Default)]
pub struct ByteWriter {
    data: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> usize {
        self.data.len()
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.bytes(&[v])
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.bytes(&v.to_le_bytes())
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.bytes(&v.to_le_bytes())
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.bytes(&v.to_le_bytes())
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.bytes(&v.to_le_bytes())
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.bytes(&v.to_le_bytes())
    }

    pub fn f32s(&mut self, values: &[f32]) -> &mut Self {
        for &v in values {
            self.f32(v);
        }
        self
    }

    pub fn cstring(&mut self, text: &str) -> &mut Self {
        self.bytes(text.as_bytes()).u8(0)
    }

    pub fn string_u8(&mut self, text: &str) -> &mut Self {
        self.u8(text.len() as u8).bytes(text.as_bytes())
    }

    pub fn string_u16(&mut self, text: &str) -> &mut Self {
        self.u16(text.len() as u16).bytes(text.as_bytes())
    }

    pub fn string_varbyte(&mut self, text: &str) -> &mut Self {
        let len = text.len();
        if len < 0x80 {
            self.u8(len as u8);
        } else {
            self.u8((len & 0x7F) as u8 | 0x80).u8((len >> 7) as u8);
        }
        self.bytes(text.as_bytes())
    }

    /// Overwrite four bytes at `at` with `v`
    pub fn patch_u32(&mut self, at: usize, v: u32) -> &mut Self {
        self.data[at..at + 4].copy_from_slice(&v.to_le_bytes());
        self
    }

    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }
}
