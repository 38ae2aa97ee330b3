use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::config::EngineParams;
use crate::error::ReportError;
use crate::transcribe::engine::{EngineOutput, Segment, TokenData};

/// Serializes one engine run into the persisted transcript artifact:
/// engine metadata, per-segment text with time offsets, optional per-token
/// detail, the submitted display title/link, and a completion timestamp.
pub struct ReportWriter {
    full_token_output: bool,
}

#[derive(Debug, Serialize)]
struct TranscriptReport<'a> {
    systeminfo: &'a str,
    model: ModelSection<'a>,
    params: ParamsSection<'a>,
    result: ResultSection<'a>,
    transcription: Vec<SegmentRecord>,
    #[serde(rename = "videoTitle")]
    video_title: &'a str,
    #[serde(rename = "videoHrefLink")]
    video_href_link: &'a str,
    #[serde(rename = "videoText")]
    video_text: String,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct ModelSection<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    multilingual: bool,
    vocab: i64,
}

#[derive(Debug, Serialize)]
struct ParamsSection<'a> {
    model: String,
    language: &'a str,
    translate: bool,
}

#[derive(Debug, Serialize)]
struct ResultSection<'a> {
    language: &'a str,
}

#[derive(Debug, Serialize)]
struct SegmentRecord {
    timestamps: TimePair,
    offsets: OffsetPair,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens: Option<Vec<TokenRecord>>,
}

#[derive(Debug, Serialize)]
struct TimePair {
    from: String,
    to: String,
}

#[derive(Debug, Serialize)]
struct OffsetPair {
    from: i64,
    to: i64,
}

#[derive(Debug, Serialize)]
struct TokenRecord {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamps: Option<TimePair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offsets: Option<OffsetPair>,
    id: i32,
    p: f32,
    t_dtw: i64,
}

impl ReportWriter {
    pub fn new(full_token_output: bool) -> Self {
        Self { full_token_output }
    }

    pub fn write(
        &self,
        output: &EngineOutput,
        params: &EngineParams,
        model_path: &Path,
        title: &str,
        link: &str,
        dest: &Path,
    ) -> Result<(), ReportError> {
        let report = self.build(output, params, model_path, title, link);

        let file = File::create(dest).map_err(|e| ReportError::Io {
            path: dest.to_path_buf(),
            source: e,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), &report)?;

        info!("Saved transcript report to {}", dest.display());
        Ok(())
    }

    fn build<'a>(
        &self,
        output: &'a EngineOutput,
        params: &'a EngineParams,
        model_path: &Path,
        title: &'a str,
        link: &'a str,
    ) -> TranscriptReport<'a> {
        let transcription: Vec<SegmentRecord> = output
            .segments
            .iter()
            .map(|s| self.segment_record(s))
            .collect();

        let video_text = flatten_text(&output.segments);

        TranscriptReport {
            systeminfo: &output.system_info,
            model: ModelSection {
                kind: &output.model.kind,
                multilingual: output.model.multilingual,
                vocab: output.model.vocab,
            },
            params: ParamsSection {
                model: model_path.display().to_string(),
                language: &params.language,
                translate: params.translate,
            },
            result: ResultSection {
                language: &output.language,
            },
            transcription,
            video_title: title,
            video_href_link: link,
            video_text,
            timestamp: chrono::Utc::now().timestamp_millis().to_string(),
        }
    }

    fn segment_record(&self, segment: &Segment) -> SegmentRecord {
        let tokens = if self.full_token_output {
            Some(segment.tokens.iter().map(token_record).collect())
        } else {
            None
        };

        SegmentRecord {
            timestamps: TimePair {
                from: format_timestamp(segment.start_cs),
                to: format_timestamp(segment.end_cs),
            },
            offsets: OffsetPair {
                from: segment.start_cs * 10,
                to: segment.end_cs * 10,
            },
            text: strip_quotes(&segment.text),
            tokens,
        }
    }
}

fn token_record(token: &TokenData) -> TokenRecord {
    let (timestamps, offsets) = if token.start_cs > -1 && token.end_cs > -1 {
        (
            Some(TimePair {
                from: format_timestamp(token.start_cs),
                to: format_timestamp(token.end_cs),
            }),
            Some(OffsetPair {
                from: token.start_cs * 10,
                to: token.end_cs * 10,
            }),
        )
    } else {
        (None, None)
    };

    TokenRecord {
        text: strip_quotes(&token.text),
        timestamps,
        offsets,
        id: token.id,
        p: token.p,
        t_dtw: token.t_dtw,
    }
}

/// Renders engine centiseconds as `HH:MM:SS,mmm`.
fn format_timestamp(cs: i64) -> String {
    let ms = cs.max(0) * 10;
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Double quotes inside recognized text are dropped rather than escaped;
/// structural escaping of the JSON itself is the serializer's job.
fn strip_quotes(text: &str) -> String {
    text.replace('"', "")
}

/// Joins segment texts into the flattened full-video transcript.
fn flatten_text(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push_str(&strip_quotes(&segment.text));
        out.push(' ');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcribe::engine::ModelInfo;

    fn sample_output() -> EngineOutput {
        EngineOutput {
            system_info: "AVX = 1".to_string(),
            model: ModelInfo {
                kind: "base".to_string(),
                multilingual: true,
                vocab: 51865,
            },
            language: "en".to_string(),
            segments: vec![
                Segment {
                    start_cs: 0,
                    end_cs: 250,
                    text: " Hello \"world\"".to_string(),
                    tokens: vec![TokenData {
                        id: 42,
                        text: "Hello".to_string(),
                        p: 0.97,
                        t_dtw: -1,
                        start_cs: 0,
                        end_cs: 120,
                    }],
                },
                Segment {
                    start_cs: 250,
                    end_cs: 730,
                    text: " again".to_string(),
                    tokens: vec![],
                },
            ],
        }
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "00:00:00,000");
        assert_eq!(format_timestamp(250), "00:00:02,500");
        // 1 h 2 min 3.45 s
        assert_eq!(format_timestamp(372_345), "01:02:03,450");
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes(r#"say "hi" now"#), "say hi now");
        assert_eq!(strip_quotes("clean"), "clean");
    }

    #[test]
    fn test_report_structure() {
        let writer = ReportWriter::new(false);
        let output = sample_output();
        let params = EngineParams::default();
        let report = writer.build(
            &output,
            &params,
            Path::new("models/ggml-base.bin"),
            "My Talk",
            "https://example.com/v/1",
        );
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["model"]["type"], "base");
        assert_eq!(json["params"]["language"], "en");
        assert_eq!(json["result"]["language"], "en");
        assert_eq!(json["videoTitle"], "My Talk");
        assert_eq!(json["videoHrefLink"], "https://example.com/v/1");
        assert_eq!(json["videoText"], " Hello world  again ");

        let seg = &json["transcription"][0];
        assert_eq!(seg["timestamps"]["from"], "00:00:00,000");
        assert_eq!(seg["timestamps"]["to"], "00:00:02,500");
        assert_eq!(seg["offsets"]["from"], 0);
        assert_eq!(seg["offsets"]["to"], 2500);
        assert_eq!(seg["text"], " Hello world");
        assert!(seg.get("tokens").is_none(), "tokens omitted by default");
    }

    #[test]
    fn test_report_full_token_output() {
        let writer = ReportWriter::new(true);
        let output = sample_output();
        let params = EngineParams::default();
        let report = writer.build(
            &output,
            &params,
            Path::new("m.bin"),
            "t",
            "l",
        );
        let json = serde_json::to_value(&report).unwrap();

        let token = &json["transcription"][0]["tokens"][0];
        assert_eq!(token["id"], 42);
        assert_eq!(token["text"], "Hello");
        assert_eq!(token["offsets"]["to"], 1200);
        // Second segment has no tokens but still carries the empty array
        assert_eq!(json["transcription"][1]["tokens"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_write_creates_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("talk.json");
        let writer = ReportWriter::new(false);

        writer
            .write(
                &sample_output(),
                &EngineParams::default(),
                Path::new("m.bin"),
                "Title",
                "link",
                &dest,
            )
            .unwrap();

        let content = std::fs::read_to_string(&dest).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["videoTitle"], "Title");
        assert!(parsed["timestamp"].as_str().unwrap().parse::<i64>().is_ok());
    }
}
