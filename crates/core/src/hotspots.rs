//! Drill-down navigation from the commit dashboard to the hotspot view

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use url::Url;

/// Build `{base}/circle_packing/{project}?start1={epoch}&end1={epoch}`.
///
/// A bare `host[:port]` base is taken as plain http.
pub fn hotspots_url(
    base: &str,
    project: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Url> {
    if end < start {
        return Err(Error::InvalidRange(format!(
            "selection ends before it starts ({} < {})",
            end.timestamp(),
            start.timestamp()
        )));
    }

    let base = if base.contains("://") {
        base.to_string()
    } else {
        format!("http://{}", base)
    };
    let mut url = Url::parse(&base)?;

    url.path_segments_mut()
        .map_err(|_| Error::ConfigError(format!("'{}' cannot be used as a base URL", base)))?
        .pop_if_empty()
        .push("circle_packing")
        .push(project);

    url.query_pairs_mut()
        .clear()
        .append_pair("start1", &start.timestamp().to_string())
        .append_pair("end1", &end.timestamp().to_string());

    Ok(url)
}
