//! Path storage as a flat tag-stream.
//!
//! A path is a `Vec<Pt>` where each segment is a tag followed by its
//! coordinates:
//!
//! | tag | segment   | payload                    |
//! |-----|-----------|----------------------------|
//! | 0   | move      | `x y`                      |
//! | 1   | line      | `x y`                      |
//! | 2   | quadratic | `cx cy x y`                |
//! | 3   | cubic     | `c1x c1y c2x c2y x y`      |
//!
//! The encoding is order-preserving and replayable. It is the contract
//! between path producers (shapes, the stroker) and consumers (bounds, the
//! rasterizer, the curve cache), and it is what `Engine::load_curve` accepts.

use crate::basics::{Point, Pt};
use crate::error::{Error, Result};

pub const TAG_MOVE: Pt = 0.0;
pub const TAG_LINE: Pt = 1.0;
pub const TAG_QUADRATIC: Pt = 2.0;
pub const TAG_CUBIC: Pt = 3.0;

/// One decoded path segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Move(Point),
    Line(Point),
    Quadratic(Point, Point),
    Cubic(Point, Point, Point),
}

impl Segment {
    /// The point this segment ends at.
    pub fn end(&self) -> Point {
        match *self {
            Segment::Move(p) | Segment::Line(p) => p,
            Segment::Quadratic(_, p) => p,
            Segment::Cubic(_, _, p) => p,
        }
    }
}

/// Number of floats following a tag, or `None` for an unknown tag.
fn payload_len(tag: Pt) -> Option<usize> {
    if tag == TAG_MOVE || tag == TAG_LINE {
        Some(2)
    } else if tag == TAG_QUADRATIC {
        Some(4)
    } else if tag == TAG_CUBIC {
        Some(6)
    } else {
        None
    }
}

/// Decode the segment starting at `offset`. Returns the segment and the
/// offset of the next one.
fn decode(data: &[Pt], offset: usize) -> Result<(Segment, usize)> {
    let tag = data[offset];
    let malformed = Error::MalformedPath { offset, tag };
    let n = payload_len(tag).ok_or_else(|| malformed.clone())?;
    let end = offset + 1 + n;
    if end > data.len() {
        return Err(malformed);
    }
    let v = &data[offset + 1..end];
    let pt = |i: usize| Point::new(v[i], v[i + 1]);
    let seg = if tag == TAG_MOVE {
        Segment::Move(pt(0))
    } else if tag == TAG_LINE {
        Segment::Line(pt(0))
    } else if tag == TAG_QUADRATIC {
        Segment::Quadratic(pt(0), pt(2))
    } else {
        Segment::Cubic(pt(0), pt(2), pt(4))
    };
    Ok((seg, end))
}

// ============================================================================
// Path
// ============================================================================

/// A sequence of curves in logical points.
///
/// No validation happens on append: callers start every curve with
/// [`add_start`](Path::add_start). Data from outside the crate goes through
/// [`from_encoded`](Path::from_encoded).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    data: Vec<Pt>,
}

impl Path {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(floats: usize) -> Self {
        Self {
            data: Vec::with_capacity(floats),
        }
    }

    /// Wrap an externally produced tag-stream after checking every record.
    pub fn from_encoded(data: Vec<Pt>) -> Result<Self> {
        Self::validate(&data)?;
        Ok(Self { data })
    }

    /// Check that `data` is a sequence of complete, known records.
    pub fn validate(data: &[Pt]) -> Result<()> {
        let mut i = 0;
        while i < data.len() {
            let (_, next) = decode(data, i)?;
            i = next;
        }
        Ok(())
    }

    /// Start a new curve at `a`.
    pub fn add_start(&mut self, a: Point) {
        self.data.extend_from_slice(&[TAG_MOVE, a.x, a.y]);
    }

    /// Add a linear segment to the current curve.
    pub fn add_line(&mut self, b: Point) {
        self.data.extend_from_slice(&[TAG_LINE, b.x, b.y]);
    }

    /// Add a quadratic segment with control point `b` ending at `c`.
    pub fn add_quadratic(&mut self, b: Point, c: Point) {
        self.data
            .extend_from_slice(&[TAG_QUADRATIC, b.x, b.y, c.x, c.y]);
    }

    /// Add a cubic segment. Encodable and rasterizable, but bounds are not
    /// implemented for cubics and the engine refuses them.
    pub fn add_cubic(&mut self, b: Point, c: Point, d: Point) {
        self.data
            .extend_from_slice(&[TAG_CUBIC, b.x, b.y, c.x, c.y, d.x, d.y]);
    }

    /// Append one decoded segment.
    pub fn push(&mut self, seg: Segment) {
        match seg {
            Segment::Move(p) => self.add_start(p),
            Segment::Line(p) => self.add_line(p),
            Segment::Quadratic(c, p) => self.add_quadratic(c, p),
            Segment::Cubic(c1, c2, p) => self.add_cubic(c1, c2, p),
        }
    }

    /// Append every segment of `other`.
    pub fn extend(&mut self, other: &Path) {
        self.data.extend_from_slice(&other.data);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The raw tag-stream.
    pub fn as_slice(&self) -> &[Pt] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<Pt> {
        self.data
    }

    /// Iterate the decoded segments in order.
    ///
    /// # Panics
    ///
    /// On a malformed record. Paths built through this API or
    /// [`from_encoded`](Path::from_encoded) never hold one.
    pub fn segments(&self) -> Segments<'_> {
        Segments {
            data: &self.data,
            pos: 0,
        }
    }

    /// Number of segments.
    pub fn num_segments(&self) -> usize {
        self.segments().count()
    }

    pub fn has_cubic(&self) -> bool {
        self.segments().any(|s| matches!(s, Segment::Cubic(..)))
    }
}

impl From<Path> for Vec<Pt> {
    fn from(p: Path) -> Self {
        p.data
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = Segment;
    type IntoIter = Segments<'a>;

    fn into_iter(self) -> Segments<'a> {
        self.segments()
    }
}

/// Iterator over the segments of a [`Path`].
pub struct Segments<'a> {
    data: &'a [Pt],
    pos: usize,
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.pos >= self.data.len() {
            return None;
        }
        match decode(self.data, self.pos) {
            Ok((seg, next)) => {
                self.pos = next;
                Some(seg)
            }
            Err(e) => panic!("invalid path: {e}"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: Pt, y: Pt) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_encoding_layout() {
        let mut path = Path::new();
        path.add_start(p(1.0, 2.0));
        path.add_line(p(3.0, 4.0));
        path.add_quadratic(p(5.0, 6.0), p(7.0, 8.0));
        assert_eq!(
            path.as_slice(),
            &[0.0, 1.0, 2.0, 1.0, 3.0, 4.0, 2.0, 5.0, 6.0, 7.0, 8.0]
        );
    }

    #[test]
    fn test_segments_replay_in_order() {
        let mut path = Path::new();
        path.add_start(p(0.0, 0.0));
        path.add_quadratic(p(5.0, 10.0), p(10.0, 0.0));
        path.add_start(p(20.0, 20.0));
        path.add_line(p(30.0, 20.0));
        path.add_cubic(p(1.0, 1.0), p(2.0, 2.0), p(3.0, 3.0));

        let segs: Vec<Segment> = path.segments().collect();
        assert_eq!(
            segs,
            vec![
                Segment::Move(p(0.0, 0.0)),
                Segment::Quadratic(p(5.0, 10.0), p(10.0, 0.0)),
                Segment::Move(p(20.0, 20.0)),
                Segment::Line(p(30.0, 20.0)),
                Segment::Cubic(p(1.0, 1.0), p(2.0, 2.0), p(3.0, 3.0)),
            ]
        );
        assert_eq!(path.num_segments(), 5);
        assert!(path.has_cubic());
        assert_eq!(segs[1].end(), p(10.0, 0.0));
    }

    #[test]
    fn test_push_matches_builders() {
        let mut a = Path::new();
        a.add_start(p(1.0, 1.0));
        a.add_quadratic(p(2.0, 3.0), p(4.0, 1.0));
        let mut b = Path::new();
        for seg in &a {
            b.push(seg);
        }
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_encoded_accepts_valid() {
        let data = vec![0.0, 1.0, 1.0, 1.0, 5.0, 5.0];
        let path = Path::from_encoded(data.clone()).unwrap();
        assert_eq!(path.as_slice(), data.as_slice());
        assert!(!path.has_cubic());
    }

    #[test]
    fn test_from_encoded_rejects_unknown_tag() {
        let err = Path::from_encoded(vec![0.0, 1.0, 1.0, 7.0, 5.0, 5.0]).unwrap_err();
        assert_eq!(err, Error::MalformedPath { offset: 3, tag: 7.0 });
    }

    #[test]
    fn test_from_encoded_rejects_truncated_record() {
        let err = Path::from_encoded(vec![0.0, 1.0, 1.0, 2.0, 5.0, 5.0]).unwrap_err();
        assert_eq!(err, Error::MalformedPath { offset: 3, tag: 2.0 });
    }

    #[test]
    fn test_fractional_tag_is_malformed() {
        assert!(Path::validate(&[0.5, 1.0, 1.0]).is_err());
    }

    #[test]
    #[should_panic(expected = "invalid path")]
    fn test_segments_panic_on_bad_record() {
        let path = Path {
            data: vec![9.0, 0.0, 0.0],
        };
        let _ = path.segments().count();
    }

    #[test]
    fn test_empty_path() {
        let path = Path::new();
        assert!(path.is_empty());
        assert_eq!(path.segments().next(), None);
        assert!(Path::validate(&[]).is_ok());
    }
}
