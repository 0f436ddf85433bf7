//! Fixed-width geometric reads on top of [`ByteCursor`]
//!
//! Components are read in the order named; nothing is normalized.

use roseread_core::{Color3, Color4, Quat, Vec2, Vec3};

use super::ByteCursor;
use crate::traits::ParseResult;

impl ByteCursor<'_> {
    pub fn read_vec2(&mut self) -> ParseResult<Vec2> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> ParseResult<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Two `i32` components, used for integer grid coordinates
    pub fn read_vec2_i32(&mut self) -> ParseResult<[i32; 2]> {
        Ok([self.read_i32()?, self.read_i32()?])
    }

    /// Two `u32` components, used for pixel coordinates
    pub fn read_vec2_u32(&mut self) -> ParseResult<[u32; 2]> {
        Ok([self.read_u32()?, self.read_u32()?])
    }

    pub fn read_vec3_i16(&mut self) -> ParseResult<[i16; 3]> {
        Ok([self.read_i16()?, self.read_i16()?, self.read_i16()?])
    }

    /// Three `f32` components stored r, g, b
    pub fn read_color3(&mut self) -> ParseResult<Color3> {
        Ok(Color3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Four `f32` components stored r, g, b, a
    pub fn read_color4(&mut self) -> ParseResult<Color4> {
        let [r, g, b, a] = self.read_f32x4()?;
        Ok(Color4::new(r, g, b, a))
    }

    pub fn read_f32x4(&mut self) -> ParseResult<[f32; 4]> {
        Ok([self.read_f32()?, self.read_f32()?, self.read_f32()?, self.read_f32()?])
    }

    pub fn read_i16x4(&mut self) -> ParseResult<[i16; 4]> {
        Ok([self.read_i16()?, self.read_i16()?, self.read_i16()?, self.read_i16()?])
    }

    /// Quaternion stored w, x, y, z
    pub fn read_quat_wxyz(&mut self) -> ParseResult<Quat> {
        let [w, x, y, z] = self.read_f32x4()?;
        Ok(Quat::new(w, x, y, z))
    }

    /// Quaternion stored x, y, z, w
    pub fn read_quat_xyzw(&mut self) -> ParseResult<Quat> {
        let [x, y, z, w] = self.read_f32x4()?;
        Ok(Quat::new(w, x, y, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_quat_component_order() {
        let data = f32_bytes(&[1.0, 2.0, 3.0, 4.0]);

        let wxyz = ByteCursor::new(&data).read_quat_wxyz().unwrap();
        assert_eq!(wxyz, Quat::new(1.0, 2.0, 3.0, 4.0));

        let xyzw = ByteCursor::new(&data).read_quat_xyzw().unwrap();
        assert_eq!(xyzw, Quat::new(4.0, 1.0, 2.0, 3.0));
    }

    #[test]
    fn test_vectors_advance_exact_width() {
        let mut data = f32_bytes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        data.extend_from_slice(&7i16.to_le_bytes());
        data.extend_from_slice(&(-8i16).to_le_bytes());
        data.extend_from_slice(&9i16.to_le_bytes());
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_vec3().unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(cursor.position(), 12);
        assert_eq!(cursor.read_vec2().unwrap(), Vec2::new(4.0, 5.0));
        assert_eq!(cursor.read_vec3_i16().unwrap(), [7, -8, 9]);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_color_is_rgba() {
        let data = f32_bytes(&[0.1, 0.2, 0.3, 0.4]);
        let color = ByteCursor::new(&data).read_color4().unwrap();
        assert_eq!(color, Color4::new(0.1, 0.2, 0.3, 0.4));
    }

    #[test]
    fn test_integer_pairs_and_rgb() {
        let mut data = Vec::new();
        data.extend_from_slice(&7u32.to_le_bytes());
        data.extend_from_slice(&u32::MAX.to_le_bytes());
        data.extend(f32_bytes(&[1.0, 0.5, 0.0]));
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_vec2_u32().unwrap(), [7, u32::MAX]);
        assert_eq!(cursor.read_color3().unwrap(), Color3::new(1.0, 0.5, 0.0));
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_truncated_vector() {
        let data = f32_bytes(&[1.0, 2.0]);
        assert!(ByteCursor::new(&data).read_vec3().is_err());
    }
}
