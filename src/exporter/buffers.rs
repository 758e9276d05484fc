use flatbuffers::FlatBufferBuilder;

use crate::exporter::TableVector;
use crate::schema::vt;

/// Raw weight blobs collected while exporting tensors.
///
/// Entry 0 is always present and empty; tensors without data point at it.
#[derive(Debug)]
pub struct BufferList<'g> {
    entries: Vec<&'g [u8]>,
}

impl<'g> BufferList<'g> {
    pub fn new() -> Self {
        Self { entries: vec![&[]] }
    }

    /// Appends a blob and returns its buffer index.
    pub fn push(&mut self, data: &'g [u8]) -> u32 {
        let index = self.entries.len() as u32;
        self.entries.push(data);
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'g [u8]> {
        self.entries.get(index).copied()
    }
}

impl Default for BufferList<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes every buffer verbatim, in insertion order.
pub fn export_buffers<'fbb>(fbb: &mut FlatBufferBuilder<'fbb>, buffers: &BufferList<'_>) -> TableVector<'fbb> {
    let mut offsets = Vec::with_capacity(buffers.len());
    for data in buffers.entries.iter().copied() {
        let data = fbb.create_vector(data);
        let start = fbb.start_table();
        fbb.push_slot_always(vt::buffer::DATA, data);
        offsets.push(fbb.end_table(start));
    }
    log::debug!("Exported {} buffers", offsets.len());
    fbb.create_vector(&offsets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_zero_is_reserved() {
        let mut buffers = BufferList::new();
        assert_eq!(buffers.len(), 1);
        assert_eq!(buffers.get(0), Some(&[][..]));

        let weights = [1u8, 2, 3];
        assert_eq!(buffers.push(&weights), 1);
        assert_eq!(buffers.push(&weights[..1]), 2);
        assert_eq!(buffers.get(2), Some(&[1u8][..]));
    }

    #[test]
    fn test_export_buffers_writes_every_entry() {
        let weights = [9u8; 7];
        let mut buffers = BufferList::new();
        buffers.push(&weights);

        let mut fbb = FlatBufferBuilder::new();
        let exported = export_buffers(&mut fbb, &buffers);
        fbb.finish_minimal(exported);

        assert!(fbb.finished_data().windows(7).any(|w| w == weights));
    }
}
