//! JSON bodies exchanged with the conversion service.

use serde::{Deserialize, Serialize};

use crate::{JobStatus, ProgressSnapshot, VideoInfo};

#[derive(Debug, Serialize)]
pub(crate) struct UrlRequest<'a> {
    pub(crate) url: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ValidateResponse {
    #[serde(default)]
    pub(crate) valid: bool,
    pub(crate) info: Option<VideoInfoBody>,
    pub(crate) error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VideoInfoBody {
    title: Option<String>,
    uploader: Option<String>,
    /// Seconds; extractors report fractional values for some sites.
    duration: Option<f64>,
    /// Some extractors send counts as floats.
    view_count: Option<f64>,
    thumbnail: Option<String>,
}

impl From<VideoInfoBody> for VideoInfo {
    fn from(body: VideoInfoBody) -> Self {
        Self {
            title: body.title.filter(|t| !t.is_empty()),
            uploader: body.uploader.filter(|u| !u.is_empty()),
            duration_secs: body
                .duration
                .filter(|d| d.is_finite() && *d > 0.0)
                .map(|d| d as u64),
            view_count: body
                .view_count
                .filter(|v| v.is_finite() && *v > 0.0)
                .map(|v| v as u64),
            thumbnail: body.thumbnail.filter(|t| !t.is_empty()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ConvertResponse {
    pub(crate) progress_id: Option<String>,
    pub(crate) error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressResponse {
    status: String,
    percent: Option<f64>,
    message: Option<String>,
}

impl From<ProgressResponse> for ProgressSnapshot {
    fn from(body: ProgressResponse) -> Self {
        let percent = body
            .percent
            .filter(|p| p.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, 100.0)
            .round() as u8;
        Self {
            status: JobStatus::from_wire(&body.status),
            percent,
            message: body.message.filter(|m| !m.is_empty()),
        }
    }
}

/// Error body the service sends with non-success download answers.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percent_is_rounded_and_clamped() {
        let body: ProgressResponse =
            serde_json::from_str(r#"{"status":"downloading","percent":45.6,"message":"x"}"#)
                .unwrap();
        let snapshot = ProgressSnapshot::from(body);
        assert_eq!(snapshot.status, JobStatus::Converting);
        assert_eq!(snapshot.percent, 46);

        let body: ProgressResponse =
            serde_json::from_str(r#"{"status":"completed","percent":140}"#).unwrap();
        let snapshot = ProgressSnapshot::from(body);
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.percent, 100);
        assert_eq!(snapshot.message, None);
    }

    #[test]
    fn fractional_duration_is_truncated() {
        let body: VideoInfoBody =
            serde_json::from_str(r#"{"title":"t","duration":212.9,"view_count":null}"#).unwrap();
        let info = VideoInfo::from(body);
        assert_eq!(info.duration_secs, Some(212));
        assert_eq!(info.view_count, None);
        assert_eq!(info.uploader, None);
    }

    #[test]
    fn view_count_accepts_any_json_number() {
        let body: VideoInfoBody =
            serde_json::from_str(r#"{"title":"t","view_count":1234.0}"#).unwrap();
        assert_eq!(VideoInfo::from(body).view_count, Some(1234));

        let body: VideoInfoBody = serde_json::from_str(r#"{"view_count":15400}"#).unwrap();
        assert_eq!(VideoInfo::from(body).view_count, Some(15400));

        let body: VideoInfoBody = serde_json::from_str(r#"{"view_count":-3}"#).unwrap();
        assert_eq!(VideoInfo::from(body).view_count, None);
    }
}
