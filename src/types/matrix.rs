//! Conversion matrices for gateways and converters.
//!
//! ## Layout
//!
//! A matrix relates the formats a bridge accepts on its sink side to the
//! formats it can emit on its source side. It is stored as a flat boolean
//! vector of `sink_formats.len() * source_formats.len()` cells in
//! **sink-major** order:
//!
//! ```text
//! index(source_idx, sink_idx) = sink_idx * source_formats.len() + source_idx
//! ```
//!
//! so each consecutive run of `source_formats.len()` cells is the row of one
//! sink format. A `true` cell means the bridge produces that source format
//! when fed with that sink format.
//!
//! Every lookup in this module (pair listing, forward and reverse
//! restriction) goes through [`ConversionMatrix::index`], so all directions
//! agree on the layout. Domain plugins that register matrices must emit them
//! in this order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::format::ConnectionFormat;

/// Format conversion rules of a gateway or converter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversionMatrix {
    /// Formats the bridge can emit on its source side.
    source_formats: Vec<ConnectionFormat>,
    /// Formats the bridge accepts on its sink side.
    sink_formats: Vec<ConnectionFormat>,
    /// Flat sink-major cells.
    cells: Vec<bool>,
}

impl ConversionMatrix {
    /// Create a matrix from raw cells in sink-major order.
    ///
    /// No validation happens here: records coming from a domain may be
    /// malformed, and such bridges are treated as unusable rather than
    /// rejected. See [`ConversionMatrix::is_well_formed`].
    pub fn new(
        source_formats: Vec<ConnectionFormat>,
        sink_formats: Vec<ConnectionFormat>,
        cells: Vec<bool>,
    ) -> Self {
        Self {
            source_formats,
            sink_formats,
            cells,
        }
    }

    /// Build a matrix from explicit `(source_format, sink_format)` pairs.
    ///
    /// Pairs naming a format absent from the respective list are ignored.
    pub fn from_pairs(
        source_formats: Vec<ConnectionFormat>,
        sink_formats: Vec<ConnectionFormat>,
        pairs: &[(ConnectionFormat, ConnectionFormat)],
    ) -> Self {
        let mut matrix = Self {
            cells: vec![false; source_formats.len() * sink_formats.len()],
            source_formats,
            sink_formats,
        };
        for &(source, sink) in pairs {
            for source_idx in positions(&matrix.source_formats, source) {
                for sink_idx in positions(&matrix.sink_formats, sink) {
                    let idx = matrix.index(source_idx, sink_idx);
                    matrix.cells[idx] = true;
                }
            }
        }
        matrix
    }

    /// Matrix that passes every format through unchanged.
    pub fn passthrough(formats: Vec<ConnectionFormat>) -> Self {
        let pairs: Vec<_> = formats.iter().map(|&f| (f, f)).collect();
        Self::from_pairs(formats.clone(), formats, &pairs)
    }

    /// Source-side formats.
    pub fn source_formats(&self) -> &[ConnectionFormat] {
        &self.source_formats
    }

    /// Sink-side formats.
    pub fn sink_formats(&self) -> &[ConnectionFormat] {
        &self.sink_formats
    }

    /// Flat index of a cell.
    pub fn index(&self, source_idx: usize, sink_idx: usize) -> usize {
        sink_idx * self.source_formats.len() + source_idx
    }

    /// Whether both format lists are non-empty and the cell count matches.
    pub fn is_well_formed(&self) -> bool {
        !self.source_formats.is_empty()
            && !self.sink_formats.is_empty()
            && self.cells.len() == self.source_formats.len() * self.sink_formats.len()
    }

    /// Whether the bridge can convert anything at all.
    pub fn is_usable(&self) -> bool {
        self.is_well_formed() && self.cells.iter().any(|&c| c)
    }

    /// Whether the cell at the given position is set.
    ///
    /// Out-of-range positions and malformed matrices read as `false`.
    pub fn get(&self, source_idx: usize, sink_idx: usize) -> bool {
        if !self.is_well_formed()
            || source_idx >= self.source_formats.len()
            || sink_idx >= self.sink_formats.len()
        {
            return false;
        }
        self.cells[self.index(source_idx, sink_idx)]
    }

    /// All legal `(source_format, sink_format)` pairs, in cell order.
    pub fn allowed_pairs(&self) -> Vec<(ConnectionFormat, ConnectionFormat)> {
        if !self.is_well_formed() {
            return Vec::new();
        }
        let width = self.source_formats.len();
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &set)| set)
            .map(|(idx, _)| (self.source_formats[idx % width], self.sink_formats[idx / width]))
            .collect()
    }

    /// Source formats producible when the bridge is fed `sink_format`.
    ///
    /// Sorted and duplicate-free. Empty when the format is not accepted.
    pub fn outputs_for_input(&self, sink_format: ConnectionFormat) -> Vec<ConnectionFormat> {
        if !self.is_well_formed() {
            return Vec::new();
        }
        let mut out = BTreeSet::new();
        for sink_idx in positions(&self.sink_formats, sink_format) {
            for (source_idx, &source) in self.source_formats.iter().enumerate() {
                if self.cells[self.index(source_idx, sink_idx)] {
                    out.insert(source);
                }
            }
        }
        out.into_iter().collect()
    }

    /// Sink formats that can be converted into `source_format`.
    ///
    /// Sorted and duplicate-free. Empty when the format is never produced.
    pub fn inputs_for_output(&self, source_format: ConnectionFormat) -> Vec<ConnectionFormat> {
        if !self.is_well_formed() {
            return Vec::new();
        }
        let mut out = BTreeSet::new();
        for source_idx in positions(&self.source_formats, source_format) {
            for (sink_idx, &sink) in self.sink_formats.iter().enumerate() {
                if self.cells[self.index(source_idx, sink_idx)] {
                    out.insert(sink);
                }
            }
        }
        out.into_iter().collect()
    }
}

fn positions(list: &[ConnectionFormat], format: ConnectionFormat) -> impl Iterator<Item = usize> + '_ {
    list.iter()
        .enumerate()
        .filter(move |&(_, &f)| f == format)
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PCM: ConnectionFormat = ConnectionFormat::new(0x100);
    const MP3: ConnectionFormat = ConnectionFormat::new(0x101);
    const AAC: ConnectionFormat = ConnectionFormat::new(0x102);

    fn decoder() -> ConversionMatrix {
        // sources: [PCM, MP3], sinks: [MP3, AAC]
        // row MP3 -> {PCM, MP3}, row AAC -> {PCM}
        ConversionMatrix::new(vec![PCM, MP3], vec![MP3, AAC], vec![true, true, true, false])
    }

    #[test]
    fn test_sink_major_index() {
        let m = decoder();
        assert_eq!(m.index(0, 0), 0);
        assert_eq!(m.index(1, 0), 1);
        assert_eq!(m.index(0, 1), 2);
        assert!(m.get(1, 0));
        assert!(!m.get(1, 1));
    }

    #[test]
    fn test_allowed_pairs() {
        assert_eq!(decoder().allowed_pairs(), vec![(PCM, MP3), (MP3, MP3), (PCM, AAC)]);
    }

    #[test]
    fn test_forward_and_reverse() {
        let m = decoder();
        assert_eq!(m.outputs_for_input(MP3), vec![PCM, MP3]);
        assert_eq!(m.outputs_for_input(AAC), vec![PCM]);
        assert!(m.outputs_for_input(PCM).is_empty());
        assert_eq!(m.inputs_for_output(PCM), vec![MP3, AAC]);
        assert_eq!(m.inputs_for_output(MP3), vec![MP3]);
    }

    #[test]
    fn test_malformed_is_unusable() {
        let wrong_size = ConversionMatrix::new(vec![PCM], vec![PCM, MP3], vec![true]);
        assert!(!wrong_size.is_well_formed());
        assert!(wrong_size.allowed_pairs().is_empty());
        assert!(wrong_size.outputs_for_input(PCM).is_empty());

        let all_false = ConversionMatrix::new(vec![PCM], vec![PCM], vec![false]);
        assert!(all_false.is_well_formed());
        assert!(!all_false.is_usable());

        let empty = ConversionMatrix::new(vec![], vec![], vec![]);
        assert!(!empty.is_usable());
    }

    #[test]
    fn test_from_pairs_matches_raw_layout() {
        let built = ConversionMatrix::from_pairs(
            vec![PCM, MP3],
            vec![MP3, AAC],
            &[(PCM, MP3), (MP3, MP3), (PCM, AAC)],
        );
        assert_eq!(built, decoder());
    }

    #[test]
    fn test_passthrough() {
        let m = ConversionMatrix::passthrough(vec![PCM, MP3]);
        assert_eq!(m.outputs_for_input(PCM), vec![PCM]);
        assert_eq!(m.outputs_for_input(MP3), vec![MP3]);
        assert!(m.is_usable());
    }
}
