//! Recorded detection frames for replaying a tracking session.
//!
//! A detection log is JSONL: an optional header line prefixed with `# `
//! describing the frame geometry, followed by one frame per line:
//!
//! ```text
//! # {"schema_version":"1.0","geometry":{"width":1920.0,"height":1080.0}}
//! {"frame":0,"boxes":[{"x":600.0,"y":300.0,"w":200.0,"h":300.0}]}
//! {"frame":1,"boxes":[],"dropped":true}
//! ```

use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, FrameGeometry};

/// Header describing the recording a detection log came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionLogHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Coordinate space the boxes are expressed in.
    pub geometry: FrameGeometry,

    /// Free-form description of the detector that produced the boxes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detector: Option<String>,
}

impl DetectionLogHeader {
    pub fn new(geometry: FrameGeometry) -> Self {
        Self {
            schema_version: "1.0".to_string(),
            geometry,
            detector: None,
        }
    }
}

/// Detector output for a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Frame index within the recording.
    pub frame: u64,

    /// Zero or more detections, in detector order.
    #[serde(default)]
    pub boxes: Vec<BoundingBox>,

    /// The camera failed to deliver this frame.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dropped: bool,
}

impl RecordedFrame {
    pub fn detected(frame: u64, boxes: Vec<BoundingBox>) -> Self {
        Self {
            frame,
            boxes,
            dropped: false,
        }
    }

    pub fn dropped(frame: u64) -> Self {
        Self {
            frame,
            boxes: Vec::new(),
            dropped: true,
        }
    }
}

/// A parsed detection log.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionLog {
    pub header: Option<DetectionLogHeader>,
    pub frames: Vec<RecordedFrame>,
}

/// Parse a detection log from JSONL content.
///
/// Blank lines and `#` comments are skipped; the first `# {...}` comment
/// that parses as a header is used as the header.
pub fn parse_detection_log(jsonl: &str) -> Result<DetectionLog, serde_json::Error> {
    let mut header = None;
    let mut frames = Vec::new();

    for line in jsonl.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            if header.is_none() {
                header = serde_json::from_str(comment.trim()).ok();
            }
            continue;
        }
        frames.push(serde_json::from_str(line)?);
    }

    Ok(DetectionLog { header, frames })
}

/// Serialize a detection log to JSONL.
pub fn serialize_detection_log(
    header: &DetectionLogHeader,
    frames: &[RecordedFrame],
) -> Result<String, serde_json::Error> {
    let mut output = format!("# {}\n", serde_json::to_string(header)?);
    for frame in frames {
        output.push_str(&serde_json::to_string(frame)?);
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_with_header() {
        let jsonl = "# {\"schema_version\":\"1.0\",\"geometry\":{\"width\":640.0,\"height\":480.0}}\n\
                     {\"frame\":0,\"boxes\":[{\"x\":1.0,\"y\":2.0,\"w\":3.0,\"h\":4.0}]}\n\
                     \n\
                     {\"frame\":1,\"dropped\":true}\n";
        let log = parse_detection_log(jsonl).unwrap();

        let header = log.header.unwrap();
        assert_eq!(header.geometry, FrameGeometry::new(640.0, 480.0));
        assert_eq!(log.frames.len(), 2);
        assert_eq!(log.frames[0].boxes.len(), 1);
        assert!(log.frames[1].dropped);
        assert!(log.frames[1].boxes.is_empty());
    }

    #[test]
    fn test_parse_log_without_header() {
        let log = parse_detection_log("{\"frame\":7,\"boxes\":[]}").unwrap();
        assert!(log.header.is_none());
        assert_eq!(log.frames[0].frame, 7);
    }

    #[test]
    fn test_plain_comment_is_not_a_header() {
        let log = parse_detection_log("# recorded in the lab\n{\"frame\":0}").unwrap();
        assert!(log.header.is_none());
        assert_eq!(log.frames.len(), 1);
    }

    #[test]
    fn test_malformed_frame_is_an_error() {
        assert!(parse_detection_log("{\"frame\":\"zero\"}").is_err());
    }

    #[test]
    fn test_serialized_log_parses_back() {
        let header = DetectionLogHeader::new(FrameGeometry::FULL_HD);
        let frames = vec![
            RecordedFrame::detected(0, vec![BoundingBox::new(10.0, 20.0, 30.0, 40.0)]),
            RecordedFrame::dropped(1),
        ];
        let jsonl = serialize_detection_log(&header, &frames).unwrap();

        assert!(jsonl.starts_with("# "));
        assert!(!jsonl.lines().nth(1).unwrap().contains("dropped"));

        let log = parse_detection_log(&jsonl).unwrap();
        assert_eq!(log.header, Some(header));
        assert_eq!(log.frames, frames);
    }
}
