//! Event publisher templating.

use std::str::FromStr;

use crate::domain::error::{GedsysError, Result};

/// Publisher kinds accepted by the templating layer. Case sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherKind {
    /// Forward matches to an external HTTP endpoint. Requires a target URL.
    Http,
    /// Render matches on the engine's own UI. Takes no target.
    Ui,
}

impl FromStr for PublisherKind {
    type Err = GedsysError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "http" => Ok(PublisherKind::Http),
            "ui" => Ok(PublisherKind::Ui),
            other => Err(GedsysError::UnsupportedPublisherKind(other.to_string())),
        }
    }
}

/// Credentials embedded in HTTP publisher definitions.
///
/// The engine expects its own pre-encrypted password string; both values
/// come from configuration so no secret is ever literal in a template.
#[derive(Debug, Clone)]
pub struct HttpCredentials {
    pub username: String,
    pub encrypted_password: String,
}

/// Render the XML definition of an event publisher.
///
/// `http` publishers require a non-empty `target_url`; `ui` publishers take
/// none.
pub fn render_publisher(
    name: &str,
    stream_name: &str,
    stream_version: &str,
    kind: PublisherKind,
    target_url: Option<&str>,
    credentials: &HttpCredentials,
) -> Result<String> {
    match kind {
        PublisherKind::Ui => Ok(format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <eventPublisher xmlns=\"http://wso2.org/carbon/eventpublisher\" \
             name=\"{name}\" statistics=\"enable\" trace=\"enable\">\n\
             <from streamName=\"{stream_name}\" version=\"{stream_version}\"/>\n\
             <mapping customMapping=\"disable\" type=\"wso2event\"/>\n\
             <to eventAdapterType=\"ui\">\n\
             </to>\n\
             </eventPublisher>"
        )),
        PublisherKind::Http => {
            let target_url = match target_url {
                Some(url) if !url.is_empty() => url,
                _ => return Err(GedsysError::MissingPublisherTarget),
            };
            Ok(format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                 <eventPublisher name=\"{name}\" statistics=\"enable\" \
                 trace=\"enable\" xmlns=\"http://wso2.org/carbon/eventpublisher\">\n\
                 <from streamName=\"{stream_name}\" version=\"{stream_version}\"/>\n\
                 <mapping customMapping=\"disable\" type=\"json\"/>\n\
                 <to eventAdapterType=\"http\">\n\
                 <property name=\"http.client.method\">HttpPost</property>\n\
                 <property name=\"http.url\">{target_url}</property>\n\
                 <property encrypted=\"true\" name=\"http.password\">{}</property>\n\
                 <property name=\"http.username\">{}</property>\n\
                 </to>\n\
                 </eventPublisher>",
                credentials.encrypted_password, credentials.username
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> HttpCredentials {
        HttpCredentials {
            username: "admin".to_string(),
            encrypted_password: "ENCRYPTED-PLACEHOLDER".to_string(),
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = PublisherKind::from_str("bogus").unwrap_err();
        assert!(matches!(err, GedsysError::UnsupportedPublisherKind(_)));
    }

    #[test]
    fn test_http_without_target_is_rejected() {
        for target in [None, Some("")] {
            let err = render_publisher(
                "pub-abc",
                "geosmart.stream.out.abc_1",
                "1.0.0",
                PublisherKind::Http,
                target,
                &credentials(),
            )
            .unwrap_err();
            assert!(matches!(err, GedsysError::MissingPublisherTarget));
        }
    }

    #[test]
    fn test_ui_publisher_has_no_url_fields() {
        let xml = render_publisher(
            "pub-abc",
            "geosmart.stream.out.abc_1",
            "1.0.0",
            PublisherKind::Ui,
            None,
            &credentials(),
        )
        .expect("ui publisher");
        assert!(xml.contains("eventAdapterType=\"ui\""));
        assert!(xml.contains("type=\"wso2event\""));
        assert!(!xml.contains("http.url"));
        assert!(!xml.contains("http.password"));
    }

    #[test]
    fn test_http_publisher_embeds_target_and_credentials() {
        let xml = render_publisher(
            "pub-abc",
            "geosmart.stream.out.abc_1",
            "1.0.0",
            PublisherKind::Http,
            Some("http://10.0.0.5:9090"),
            &credentials(),
        )
        .expect("http publisher");
        assert!(xml.contains("<property name=\"http.client.method\">HttpPost</property>"));
        assert!(xml.contains("<property name=\"http.url\">http://10.0.0.5:9090</property>"));
        assert!(xml.contains(
            "<property encrypted=\"true\" name=\"http.password\">ENCRYPTED-PLACEHOLDER</property>"
        ));
        assert!(xml.contains("<property name=\"http.username\">admin</property>"));
        assert!(xml.contains("streamName=\"geosmart.stream.out.abc_1\" version=\"1.0.0\""));
    }
}
