use bytemuck::{Pod, Zeroable};
use glam::DVec3;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

/// Range of vertices drawn with one material slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawGroup {
    pub start: usize,
    pub count: usize,
    pub material_index: usize,
}

/// Flat position buffer of a line-segment or triangle mesh.
///
/// `dirty` is raised whenever a slot is written and cleared by the renderer
/// once the data has been uploaded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexBuffer {
    vertices: Vec<Vertex>,
    groups: Vec<DrawGroup>,
    dirty: bool,
}

impl VertexBuffer {
    pub fn with_len(len: usize) -> Self {
        Self {
            vertices: vec![Vertex::default(); len],
            groups: Vec::new(),
            dirty: true,
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn set_xyz(&mut self, slot: usize, p: DVec3) {
        if let Some(v) = self.vertices.get_mut(slot) {
            v.position = p.as_vec3().to_array();
        }
    }

    pub fn position(&self, slot: usize) -> Option<DVec3> {
        self.vertices
            .get(slot)
            .map(|v| DVec3::new(v.position[0] as f64, v.position[1] as f64, v.position[2] as f64))
    }

    pub fn add_group(&mut self, start: usize, count: usize, material_index: usize) {
        self.groups.push(DrawGroup {
            start,
            count,
            material_index,
        });
    }

    pub fn groups(&self) -> &[DrawGroup] {
        &self.groups
    }

    /// Positions as `x0 y0 z0 x1 ...`, ready for a float attribute.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether an upload is pending and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_are_laid_out_per_vertex() {
        let mut buf = VertexBuffer::with_len(2);
        buf.set_xyz(1, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(buf.as_floats(), &[0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn out_of_range_slot_is_ignored() {
        let mut buf = VertexBuffer::with_len(1);
        buf.set_xyz(5, DVec3::ONE);
        assert_eq!(buf.position(0), Some(DVec3::ZERO));
    }

    #[test]
    fn take_dirty_clears_flag() {
        let mut buf = VertexBuffer::with_len(1);
        assert!(buf.take_dirty());
        assert!(!buf.is_dirty());
        buf.mark_dirty();
        assert!(buf.take_dirty());
    }
}
