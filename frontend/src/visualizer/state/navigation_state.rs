//! The viewer's navigation state and its bookmark string form.
//!
//! Bookmark format: `chr1,chr2,zoom,x,y,pixelSize,normalization`.
//! Two legacy layouts are still read: nine fields with viewport width and
//! height between the offsets and the pixel size, and six fields without a
//! normalization.

use serde::{Deserialize, Serialize};
use shared::{DEFAULT_PIXEL_SIZE, Locus, Normalization};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StateRecord", into = "StateRecord")]
pub struct NavigationState {
    pub(crate) chr1_index: usize,
    pub(crate) chr2_index: usize,
    pub(crate) zoom_index: usize,
    pub(crate) bin_x: f64,
    pub(crate) bin_y: f64,
    pub(crate) pixel_size: f64,
    pub(crate) normalization: Normalization,
    pub(crate) locus: Option<Locus>,
    pub(crate) selected_gene: Option<String>,
}

impl NavigationState {
    /// Builds a state in upper-triangle orientation: when `chr1 > chr2` the
    /// chromosomes are swapped together with the bin offsets.
    pub fn new(
        chr1_index: usize,
        chr2_index: usize,
        zoom_index: usize,
        bin_x: f64,
        bin_y: f64,
        pixel_size: f64,
        normalization: Normalization,
    ) -> Self {
        let (chr1_index, chr2_index, bin_x, bin_y) = if chr1_index > chr2_index {
            (chr2_index, chr1_index, bin_y, bin_x)
        } else {
            (chr1_index, chr2_index, bin_x, bin_y)
        };
        Self {
            chr1_index,
            chr2_index,
            zoom_index,
            bin_x,
            bin_y,
            pixel_size,
            normalization,
            locus: None,
            selected_gene: None,
        }
    }

    pub fn with_locus(mut self, locus: Locus) -> Self {
        self.locus = Some(locus);
        self
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn chr1_index(&self) -> usize {
        self.chr1_index
    }

    pub fn chr2_index(&self) -> usize {
        self.chr2_index
    }

    pub fn zoom_index(&self) -> usize {
        self.zoom_index
    }

    pub fn bin_x(&self) -> f64 {
        self.bin_x
    }

    pub fn bin_y(&self) -> f64 {
        self.bin_y
    }

    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    pub fn normalization(&self) -> &Normalization {
        &self.normalization
    }

    pub fn locus(&self) -> Option<&Locus> {
        self.locus.as_ref()
    }

    pub fn selected_gene(&self) -> Option<&str> {
        self.selected_gene.as_deref()
    }

    pub(crate) fn set_normalization(&mut self, normalization: Normalization) {
        self.normalization = normalization;
    }

    pub(crate) fn set_selected_gene(&mut self, gene: Option<String>) {
        self.selected_gene = gene;
    }

    /// Swap axes when the chromosome pair is in lower-triangle orientation.
    pub(crate) fn transpose_if_needed(&mut self) {
        if self.chr1_index > self.chr2_index {
            std::mem::swap(&mut self.chr1_index, &mut self.chr2_index);
            std::mem::swap(&mut self.bin_x, &mut self.bin_y);
            if let Some(locus) = self.locus.as_mut() {
                std::mem::swap(&mut locus.x, &mut locus.y);
            }
        }
    }
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::new(0, 0, 0, 0.0, 0.0, DEFAULT_PIXEL_SIZE, Normalization::default())
    }
}

impl fmt::Display for NavigationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{}",
            self.chr1_index,
            self.chr2_index,
            self.zoom_index,
            self.bin_x,
            self.bin_y,
            self.pixel_size,
            self.normalization
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookmarkParseError {
    #[error("expected 6, 7 or 9 comma-separated fields, found {0}")]
    FieldCount(usize),
    #[error("invalid {field} `{value}`")]
    InvalidField { field: &'static str, value: String },
}

impl FromStr for NavigationState {
    type Err = BookmarkParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = input.trim().split(',').map(str::trim).collect();
        let (pixel_size, normalization) = match fields.len() {
            6 => (fields[5], None),
            7 => (fields[5], Some(fields[6])),
            // legacy layout carried the viewport size, which is not state
            9 => (fields[7], Some(fields[8])),
            count => return Err(BookmarkParseError::FieldCount(count)),
        };
        Ok(Self::new(
            parse_field("chr1", fields[0])?,
            parse_field("chr2", fields[1])?,
            parse_field("zoom", fields[2])?,
            parse_offset("x", fields[3])?,
            parse_offset("y", fields[4])?,
            parse_pixel_size(pixel_size)?,
            normalization.map(Normalization::new).unwrap_or_default(),
        ))
    }
}

fn parse_field<T: FromStr>(field: &'static str, value: &str) -> Result<T, BookmarkParseError> {
    value.parse().map_err(|_| invalid(field, value))
}

/// Bin offsets are finite and never negative.
fn parse_offset(field: &'static str, value: &str) -> Result<f64, BookmarkParseError> {
    let offset: f64 = parse_field(field, value)?;
    if offset.is_finite() && offset >= 0.0 {
        Ok(offset)
    } else {
        Err(invalid(field, value))
    }
}

fn parse_pixel_size(value: &str) -> Result<f64, BookmarkParseError> {
    let pixel_size: f64 = parse_field("pixel size", value)?;
    if pixel_size.is_finite() && pixel_size > 0.0 {
        Ok(pixel_size)
    } else {
        Err(invalid("pixel size", value))
    }
}

fn invalid(field: &'static str, value: &str) -> BookmarkParseError {
    BookmarkParseError::InvalidField {
        field,
        value: value.to_string(),
    }
}

/// Serialized shape; deserializing goes through [`NavigationState::new`].
#[derive(Serialize, Deserialize)]
struct StateRecord {
    chr1: usize,
    chr2: usize,
    zoom: usize,
    x: f64,
    y: f64,
    pixel_size: f64,
    #[serde(default)]
    normalization: Normalization,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    locus: Option<Locus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selected_gene: Option<String>,
}

impl From<StateRecord> for NavigationState {
    fn from(record: StateRecord) -> Self {
        let mut state = Self {
            chr1_index: record.chr1,
            chr2_index: record.chr2,
            zoom_index: record.zoom,
            bin_x: record.x,
            bin_y: record.y,
            pixel_size: record.pixel_size,
            normalization: record.normalization,
            locus: record.locus,
            selected_gene: record.selected_gene,
        };
        state.transpose_if_needed();
        state
    }
}

impl From<NavigationState> for StateRecord {
    fn from(state: NavigationState) -> Self {
        Self {
            chr1: state.chr1_index,
            chr2: state.chr2_index,
            zoom: state.zoom_index,
            x: state.bin_x,
            y: state.bin_y,
            pixel_size: state.pixel_size,
            normalization: state.normalization,
            locus: state.locus,
            selected_gene: state.selected_gene,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::AxisLocus;

    #[test]
    fn construction_keeps_upper_triangle() {
        let state = NavigationState::new(3, 1, 2, 10.0, 20.0, 4.0, Normalization::default());
        assert_eq!((state.chr1_index(), state.chr2_index()), (1, 3));
        assert_eq!((state.bin_x(), state.bin_y()), (20.0, 10.0));
    }

    #[test]
    fn default_state_is_zeroed() {
        let state = NavigationState::default();
        assert_eq!(state.to_string(), "0,0,0,0,0,1,NONE");
        assert!(state.locus().is_none());
        assert!(state.selected_gene().is_none());
    }

    #[test]
    fn bookmark_survives_display_and_parse() {
        let state = NavigationState::new(1, 2, 3, 12.5, 7.25, 2.0, "KR".into());
        let text = state.to_string();
        assert_eq!(text, "1,2,3,12.5,7.25,2,KR");
        assert_eq!(text.parse::<NavigationState>(), Ok(state));
    }

    #[test]
    fn reads_legacy_layouts() {
        let nine: NavigationState = "1,1,2,5,6,800,600,3,VC".parse().unwrap();
        assert_eq!(nine.pixel_size(), 3.0);
        assert_eq!(nine.normalization().as_str(), "VC");

        let six: NavigationState = "2,1,0,5,6,1.5".parse().unwrap();
        assert_eq!((six.chr1_index(), six.chr2_index()), (1, 2));
        assert_eq!((six.bin_x(), six.bin_y()), (6.0, 5.0));
        assert_eq!(six.normalization().as_str(), Normalization::NONE);
    }

    #[test]
    fn rejects_malformed_bookmarks() {
        assert_eq!(
            "1,2,3".parse::<NavigationState>(),
            Err(BookmarkParseError::FieldCount(3))
        );
        assert_eq!(
            "1,b,3,0,0,1,NONE".parse::<NavigationState>(),
            Err(BookmarkParseError::InvalidField {
                field: "chr2",
                value: "b".into()
            })
        );
    }

    #[test]
    fn rejects_non_finite_and_negative_numbers() {
        for (bookmark, field, value) in [
            ("1,1,0,NaN,0,1,NONE", "x", "NaN"),
            ("1,1,0,0,inf,1,NONE", "y", "inf"),
            ("1,1,0,-3,0,1,NONE", "x", "-3"),
            ("1,1,0,0,0,0,NONE", "pixel size", "0"),
            ("1,1,0,0,0,-inf,NONE", "pixel size", "-inf"),
        ] {
            assert_eq!(
                bookmark.parse::<NavigationState>(),
                Err(BookmarkParseError::InvalidField { field, value: value.into() }),
                "{bookmark}"
            );
        }
        assert!("1,1,0,1e14,0,1,NONE".parse::<NavigationState>().is_ok());
    }

    #[test]
    fn json_form_transposes_on_read() {
        let json = r#"{"chr1":4,"chr2":2,"zoom":1,"x":1.0,"y":9.0,"pixel_size":2.0,
            "locus":{"x":{"chr":"chr4","start":1,"end":10},"y":{"chr":"chr2","start":5,"end":50}},
            "selected_gene":"MYC"}"#;
        let state: NavigationState = serde_json::from_str(json).unwrap();
        assert_eq!((state.chr1_index(), state.chr2_index()), (2, 4));
        assert_eq!(state.bin_x(), 9.0);
        let locus = state.locus().unwrap();
        assert_eq!(locus.x, AxisLocus { chr: "chr2".into(), start: 5, end: 50 });
        assert_eq!(state.selected_gene(), Some("MYC"));
        assert_eq!(state.normalization().as_str(), Normalization::NONE);

        let back: NavigationState =
            serde_json::from_str(&serde_json::to_string(&state).unwrap()).unwrap();
        assert_eq!(back, state);
    }
}
