//! # Segment Builder
//!
//! Cuts a member into the segments that each receive one plate combination.
//!
//! - `uniform`: one segment over the full member length.
//! - `by_bay_spacing`: segments follow bay boundaries. Bays come from the
//!   member's explicit bay pattern if it has one, else from a uniform bay
//!   spacing (member value first, then the config default). Bays are clipped
//!   to the member length and any leftover length becomes a final remainder
//!   segment. With no bay data at all the member falls back to `uniform`.
//!
//! With a `splice_limit_m` set, any segment longer than the limit is then cut
//! into limit-sized pieces followed by the remainder.
//!
//! The segments of a member are contiguous, non-overlapping, and their
//! lengths sum to the member length. The last segment always ends exactly at
//! the member length.
//!
//! ## Example
//!
//! ```rust
//! use plate_core::config::{Config, SegmentRule};
//! use plate_core::member::{FrameType, Member};
//! use plate_core::segments::SegmentBuilder;
//!
//! let config = Config::default().with_segment_rule(SegmentRule::ByBaySpacing, Some(3.0));
//! let member = Member::new("M1", 10.0, FrameType::ClearSpan);
//!
//! let segments = SegmentBuilder::new(&config).build(&member).unwrap();
//! let lengths: Vec<f64> = segments.iter().map(|s| s.length_m).collect();
//! assert_eq!(lengths.len(), 4);
//! assert!((lengths[3] - 1.0).abs() < 1e-9);
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{Config, SegmentRule};
use crate::errors::{PlateError, PlateResult};
use crate::member::{DesignCode, FrameType, Member};

/// Lengths closer than this (m) are treated as equal when clipping bays
pub const LENGTH_TOLERANCE_M: f64 = 1e-9;

/// A length-bounded portion of a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Owning member mark
    pub member_id: String,

    /// 1-based position along the member
    pub index: usize,

    /// Distance from the member start to the segment start (m)
    pub start_m: f64,

    /// Segment length (m), always > 0
    pub length_m: f64,

    /// Length of the whole member (m), used for span-dependent depth limits
    pub member_length_m: f64,

    pub frame_type: FrameType,

    pub design_code: Option<DesignCode>,
}

impl Segment {
    /// Distance from the member start to the segment end (m)
    pub fn end_m(&self) -> f64 {
        self.start_m + self.length_m
    }

    /// Report mark, e.g. "M1-2"
    pub fn mark(&self) -> String {
        format!("{}-{}", self.member_id, self.index)
    }
}

/// Bay pattern expression `n@w+n@w+...`, e.g. `1@7.985+5@7.99+1@7.985`
/// (counts of bays at a width in meters).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BayPattern {
    expression: String,
    bays_m: Vec<f64>,
}

impl BayPattern {
    /// Individual bay widths in order (m)
    pub fn bays_m(&self) -> &[f64] {
        &self.bays_m
    }

    pub fn total_bays(&self) -> usize {
        self.bays_m.len()
    }

    /// Frame lines bounding the bays
    pub fn total_frames(&self) -> usize {
        self.bays_m.len() + 1
    }

    pub fn total_length_m(&self) -> f64 {
        self.bays_m.iter().sum()
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl FromStr for BayPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expression = s.trim();
        if expression.is_empty() {
            return Err("empty bay pattern".to_string());
        }

        let mut bays_m = Vec::new();
        for part in expression.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            let (count, width) = part
                .split_once('@')
                .ok_or_else(|| format!("invalid group '{}', use n@w such as 5@7.5", part))?;
            let count: usize = count
                .trim()
                .parse()
                .map_err(|_| format!("invalid bay count in '{}'", part))?;
            let width: f64 = width
                .trim()
                .parse()
                .map_err(|_| format!("invalid bay width in '{}'", part))?;
            if !width.is_finite() || width <= 0.0 {
                return Err(format!("bay width must be positive in '{}'", part));
            }
            bays_m.extend(std::iter::repeat(width).take(count));
        }

        if bays_m.is_empty() {
            return Err("bay pattern contains no bays".to_string());
        }

        Ok(BayPattern {
            expression: expression.to_string(),
            bays_m,
        })
    }
}

impl TryFrom<String> for BayPattern {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BayPattern> for String {
    fn from(pattern: BayPattern) -> String {
        pattern.expression
    }
}

impl std::fmt::Display for BayPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.expression)
    }
}

/// Derives segment boundaries from the config's segment rule
#[derive(Debug, Clone, Copy)]
pub struct SegmentBuilder<'a> {
    config: &'a Config,
}

impl<'a> SegmentBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        SegmentBuilder { config }
    }

    /// Build the ordered segments of a member
    pub fn build(&self, member: &Member) -> PlateResult<Vec<Segment>> {
        member.validate()?;

        let mut lengths = match self.config.segment_rule {
            SegmentRule::Uniform => vec![member.length_m],
            SegmentRule::ByBaySpacing => self.bay_lengths(member)?,
        };

        if let Some(limit) = self.config.splice_limit_m {
            let before = lengths.len();
            lengths = split_at_splices(lengths, limit);
            if lengths.len() > before {
                tracing::debug!(
                    member = %member.member_id,
                    splice_limit_m = limit,
                    added = lengths.len() - before,
                    "split segments at splice limit"
                );
            }
        }

        let mut segments = Vec::with_capacity(lengths.len());
        let mut start_m = 0.0;
        for (i, length_m) in lengths.into_iter().enumerate() {
            segments.push(Segment {
                member_id: member.member_id.clone(),
                index: i + 1,
                start_m,
                length_m,
                member_length_m: member.length_m,
                frame_type: member.frame_type,
                design_code: member.design_code,
            });
            start_m += length_m;
        }

        tracing::debug!(
            member = %member.member_id,
            rule = ?self.config.segment_rule,
            segments = segments.len(),
            "built segments"
        );
        Ok(segments)
    }

    fn bay_lengths(&self, member: &Member) -> PlateResult<Vec<f64>> {
        if let Some(pattern) = &member.bay_pattern {
            return Ok(clip_bays(member.length_m, pattern.bays_m().iter().copied()));
        }

        let bay_m = match member.bay_spacing_m.or(self.config.bay_spacing_m) {
            Some(bay) => bay,
            None => {
                tracing::debug!(member = %member.member_id, "no bay data, using a single segment");
                return Ok(vec![member.length_m]);
            }
        };

        if !bay_m.is_finite() || bay_m <= 0.0 {
            return Err(PlateError::config(
                "bay_spacing_m",
                format!(
                    "bay spacing must be positive for by_bay_spacing, got {} (member '{}')",
                    bay_m, member.member_id
                ),
            ));
        }

        Ok(clip_bays(member.length_m, std::iter::repeat(bay_m)))
    }
}

/// Lay bays end to end from 0 up to `total_m`.
///
/// Each boundary is accumulated from the start so lengths telescope to the
/// total; the last segment ends at `total_m` exactly. A leftover shorter than
/// [`LENGTH_TOLERANCE_M`] is merged into the previous segment.
fn clip_bays(total_m: f64, bays: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut lengths = Vec::new();
    let mut start = 0.0_f64;

    for bay in bays {
        if start >= total_m - LENGTH_TOLERANCE_M {
            break;
        }
        let end = start + bay;
        if end >= total_m - LENGTH_TOLERANCE_M {
            lengths.push(total_m - start);
            start = total_m;
            break;
        }
        lengths.push(end - start);
        start = end;
    }

    if start < total_m {
        let remainder = total_m - start;
        match lengths.last_mut() {
            Some(last) if remainder <= LENGTH_TOLERANCE_M => *last += remainder,
            _ => lengths.push(remainder),
        }
    }

    lengths
}

/// Cut every length above `limit_m` into `limit_m` pieces plus the remainder.
///
/// The remainder is taken as the length minus the pieces, so the lengths of
/// each original segment still add up exactly.
fn split_at_splices(lengths: Vec<f64>, limit_m: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(lengths.len());
    for length in lengths {
        let mut pieces = 0usize;
        while length - pieces as f64 * limit_m > limit_m + LENGTH_TOLERANCE_M {
            out.push(limit_m);
            pieces += 1;
        }
        out.push(length - pieces as f64 * limit_m);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bay_config(bay: Option<f64>) -> Config {
        Config::default().with_segment_rule(SegmentRule::ByBaySpacing, bay)
    }

    fn lengths(segments: &[Segment]) -> Vec<f64> {
        segments.iter().map(|s| s.length_m).collect()
    }

    fn assert_partition(segments: &[Segment], total: f64) {
        let sum: f64 = segments.iter().map(|s| s.length_m).sum();
        assert!((sum - total).abs() < 1e-9, "sum {} != {}", sum, total);
        assert_eq!(segments[0].start_m, 0.0);
        for pair in segments.windows(2) {
            assert!((pair[0].end_m() - pair[1].start_m).abs() < 1e-9);
        }
        for s in segments {
            assert!(s.length_m > 0.0);
        }
    }

    #[test]
    fn test_uniform_single_segment() {
        let config = Config::default();
        let member = Member::new("M1", 12.5, FrameType::ClearSpan);
        let segments = SegmentBuilder::new(&config).build(&member).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].length_m, 12.5);
        assert_eq!(segments[0].mark(), "M1-1");
    }

    #[test]
    fn test_by_bay_spacing_with_remainder() {
        let config = bay_config(Some(3.0));
        let member = Member::new("M1", 10.0, FrameType::ClearSpan);
        let segments = SegmentBuilder::new(&config).build(&member).unwrap();
        let got = lengths(&segments);
        assert_eq!(got.len(), 4);
        for (g, want) in got.iter().zip([3.0, 3.0, 3.0, 1.0]) {
            assert!((g - want).abs() < 1e-9);
        }
        assert_partition(&segments, 10.0);
        assert_eq!(segments[3].index, 4);
    }

    #[test]
    fn test_exact_multiple_has_no_remainder() {
        let config = bay_config(Some(2.5));
        let member = Member::new("M1", 10.0, FrameType::ClearSpan);
        let segments = SegmentBuilder::new(&config).build(&member).unwrap();
        assert_eq!(lengths(&segments), vec![2.5, 2.5, 2.5, 2.5]);
    }

    #[test]
    fn test_bay_longer_than_member() {
        let config = bay_config(Some(8.0));
        let member = Member::new("M1", 5.0, FrameType::ClearSpan);
        let segments = SegmentBuilder::new(&config).build(&member).unwrap();
        assert_eq!(lengths(&segments), vec![5.0]);
    }

    #[test]
    fn test_member_bay_overrides_config() {
        let config = bay_config(Some(3.0));
        let member = Member::new("M1", 10.0, FrameType::ClearSpan).with_bay_spacing(5.0);
        let segments = SegmentBuilder::new(&config).build(&member).unwrap();
        assert_eq!(lengths(&segments), vec![5.0, 5.0]);
    }

    #[test]
    fn test_no_bay_data_falls_back_to_uniform() {
        let config = bay_config(None);
        let member = Member::new("M1", 10.0, FrameType::ClearSpan);
        let segments = SegmentBuilder::new(&config).build(&member).unwrap();
        assert_eq!(lengths(&segments), vec![10.0]);
    }

    #[test]
    fn test_non_positive_bay_is_config_error() {
        // Bypasses Config::validate to reach the builder's own check
        let mut config = bay_config(None);
        config.bay_spacing_m = Some(0.0);
        let member = Member::new("M1", 10.0, FrameType::ClearSpan);
        let err = SegmentBuilder::new(&config).build(&member).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_member_bay_non_positive_is_config_error() {
        let config = bay_config(Some(3.0));
        let member = Member::new("M1", 10.0, FrameType::ClearSpan).with_bay_spacing(-3.0);
        let err = SegmentBuilder::new(&config).build(&member).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("M1"));

        // Not read under uniform
        let uniform = Config::default();
        assert_eq!(SegmentBuilder::new(&uniform).build(&member).unwrap().len(), 1);
    }

    #[test]
    fn test_splice_limit_splits_uniform_member() {
        let config = Config::default().with_splice_limit(Some(7.0));
        let member = Member::new("M1", 30.0, FrameType::ClearSpan);
        let segments = SegmentBuilder::new(&config).build(&member).unwrap();
        let got = lengths(&segments);
        assert_eq!(got.len(), 5);
        for (g, want) in got.iter().zip([7.0, 7.0, 7.0, 7.0, 2.0]) {
            assert!((g - want).abs() < 1e-9);
        }
        assert_partition(&segments, 30.0);
        assert_eq!(segments[4].mark(), "M1-5");
        assert!(segments.iter().all(|s| s.member_length_m == 30.0));
    }

    #[test]
    fn test_splice_limit_splits_long_bays_only() {
        let config = bay_config(None).with_splice_limit(Some(7.0));
        let pattern: BayPattern = "1@8+1@6+1@14".parse().unwrap();
        let member = Member::new("M1", 28.0, FrameType::ClearSpan).with_bay_pattern(pattern);
        let segments = SegmentBuilder::new(&config).build(&member).unwrap();
        let got = lengths(&segments);
        assert_eq!(got.len(), 5);
        for (g, want) in got.iter().zip([7.0, 1.0, 6.0, 7.0, 7.0]) {
            assert!((g - want).abs() < 1e-9);
        }
        assert_partition(&segments, 28.0);
    }

    #[test]
    fn test_splice_limit_equal_to_bay_keeps_bay() {
        let config = bay_config(Some(7.0)).with_splice_limit(Some(7.0));
        let member = Member::new("M1", 14.0, FrameType::ClearSpan);
        let segments = SegmentBuilder::new(&config).build(&member).unwrap();
        assert_eq!(lengths(&segments), vec![7.0, 7.0]);
    }

    #[test]
    fn test_bay_pattern_clipped_to_member() {
        let config = bay_config(Some(3.0));
        let pattern: BayPattern = "2@4+1@6".parse().unwrap();
        let member = Member::new("M1", 11.0, FrameType::ClearSpan).with_bay_pattern(pattern);
        let segments = SegmentBuilder::new(&config).build(&member).unwrap();
        assert_eq!(lengths(&segments), vec![4.0, 4.0, 3.0]);
    }

    #[test]
    fn test_bay_pattern_shorter_than_member_adds_remainder() {
        let config = bay_config(None);
        let pattern: BayPattern = "2@4".parse().unwrap();
        let member = Member::new("M1", 10.0, FrameType::ClearSpan).with_bay_pattern(pattern);
        let segments = SegmentBuilder::new(&config).build(&member).unwrap();
        assert_eq!(lengths(&segments), vec![4.0, 4.0, 2.0]);
    }

    #[test]
    fn test_parse_bay_pattern() {
        let pattern: BayPattern = "1@7.985+5@7.99+1@7.985".parse().unwrap();
        assert_eq!(pattern.total_bays(), 7);
        assert_eq!(pattern.total_frames(), 8);
        assert!((pattern.total_length_m() - 55.92).abs() < 1e-9);
        assert_eq!(pattern.bays_m()[0], 7.985);
        assert_eq!(pattern.bays_m()[6], 7.985);
    }

    #[test]
    fn test_parse_bay_pattern_errors() {
        assert!("".parse::<BayPattern>().is_err());
        assert!("7.5".parse::<BayPattern>().is_err());
        assert!("x@7.5".parse::<BayPattern>().is_err());
        assert!("2@-1".parse::<BayPattern>().is_err());
        assert!("0@6".parse::<BayPattern>().is_err());
    }

    #[test]
    fn test_bay_pattern_serializes_as_expression() {
        let pattern: BayPattern = "3@6".parse().unwrap();
        let json = serde_json::to_string(&pattern).unwrap();
        assert_eq!(json, "\"3@6\"");
        let back: BayPattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pattern);
    }

    proptest! {
        #[test]
        fn prop_segments_partition_member(total in 0.5f64..80.0, bay in 0.3f64..12.0) {
            let config = bay_config(Some(bay));
            let member = Member::new("P", total, FrameType::MultiSpan);
            let segments = SegmentBuilder::new(&config).build(&member).unwrap();

            let sum: f64 = segments.iter().map(|s| s.length_m).sum();
            prop_assert!((sum - total).abs() < 1e-9);
            prop_assert_eq!(segments[0].start_m, 0.0);
            prop_assert!((segments.last().unwrap().end_m() - total).abs() < 1e-9);
            for pair in segments.windows(2) {
                prop_assert!((pair[0].end_m() - pair[1].start_m).abs() < 1e-9);
            }
            for s in &segments {
                prop_assert!(s.length_m > 0.0);
            }
        }

        #[test]
        fn prop_splice_limit_keeps_partition(
            total in 0.5f64..80.0,
            bay in proptest::option::of(0.3f64..12.0),
            limit in 0.5f64..9.0,
        ) {
            let config = bay_config(bay).with_splice_limit(Some(limit));
            let member = Member::new("P", total, FrameType::MultiSpan);
            let segments = SegmentBuilder::new(&config).build(&member).unwrap();

            let sum: f64 = segments.iter().map(|s| s.length_m).sum();
            prop_assert!((sum - total).abs() < 1e-9);
            prop_assert!((segments.last().unwrap().end_m() - total).abs() < 1e-9);
            for pair in segments.windows(2) {
                prop_assert!((pair[0].end_m() - pair[1].start_m).abs() < 1e-9);
            }
            for s in &segments {
                prop_assert!(s.length_m > 0.0);
                prop_assert!(s.length_m <= limit + 1e-9);
            }
        }
    }
}
