//! Dictionary generation through an external CIM importer
//!
//! The importer owns the CIM queries; this side only names the triple store
//! and the feeders to select, and captures the dictionary text it returns.

use std::io::Write;
use std::time::Duration;

use common::ImporterConfig;
use errors::{PubsError, PubsResult};
use serde::Serialize;
use tracing::{debug, info};

/// Feeder selection against one triple-store endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeederQuery {
    endpoint: String,
    feeders: Vec<String>,
}

impl FeederQuery {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            feeders: Vec::new(),
        }
    }

    /// Restrict the query to a feeder (model) mRID
    pub fn add_feeder_selection(&mut self, feeder_id: impl Into<String>) {
        let feeder_id = feeder_id.into();
        if !self.feeders.contains(&feeder_id) {
            self.feeders.push(feeder_id);
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn feeders(&self) -> &[String] {
        &self.feeders
    }

    /// SPARQL clause binding `?fdrid` to the selected feeders
    pub fn selection_clause(&self) -> String {
        let values: Vec<String> = self
            .feeders
            .iter()
            .map(|feeder| format!("\"{}\"", feeder.replace('\\', "\\\\").replace('"', "\\\"")))
            .collect();
        format!("VALUES ?fdrid {{{}}}", values.join(" "))
    }
}

/// Produces a measurement dictionary document for a feeder query
pub trait DictionaryGenerator: Send + Sync {
    /// Write the dictionary text for `query` to `out`
    fn generate_dictionary(&self, query: &FeederQuery, out: &mut dyn Write) -> PubsResult<()>;
}

#[derive(Serialize)]
struct DictionaryRequest<'a> {
    endpoint: &'a str,
    feeders: &'a [String],
    selection: String,
}

/// Generator backed by an importer service reached over HTTP
///
/// The request is a JSON POST of the query; the response body is the
/// dictionary document. No retry is attempted.
#[derive(Debug, Clone)]
pub struct HttpDictionaryGenerator {
    url: Option<String>,
    timeout: Duration,
}

impl HttpDictionaryGenerator {
    pub fn new(url: Option<String>, timeout: Duration) -> Self {
        Self {
            url: url.filter(|u| !u.trim().is_empty()),
            timeout,
        }
    }

    pub fn from_config(config: &ImporterConfig) -> Self {
        Self::new(config.url.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

impl DictionaryGenerator for HttpDictionaryGenerator {
    fn generate_dictionary(&self, query: &FeederQuery, out: &mut dyn Write) -> PubsResult<()> {
        let url = self.url.as_deref().ok_or_else(|| {
            PubsError::acquisition(query.endpoint(), "no dictionary importer url configured")
        })?;

        info!(
            "Requesting dictionary for {:?} from {} (triple store {})",
            query.feeders(),
            url,
            query.endpoint()
        );

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| PubsError::acquisition(url, format!("client setup failed: {}", e)))?;

        let request = DictionaryRequest {
            endpoint: query.endpoint(),
            feeders: query.feeders(),
            selection: query.selection_clause(),
        };

        let response = client
            .post(url)
            .json(&request)
            .send()
            .map_err(|e| PubsError::acquisition(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PubsError::acquisition(
                url,
                format!("importer responded with {}", status),
            ));
        }

        let body = response
            .text()
            .map_err(|e| PubsError::acquisition(url, e))?;
        debug!("Importer returned {} bytes", body.len());

        out.write_all(body.as_bytes())
            .map_err(|e| PubsError::acquisition(url, e))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serve one HTTP request with `status` and `body`, returning the raw request
    fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/dict", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut head = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
                head.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();

            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            head + &String::from_utf8(body).unwrap()
        });

        (url, handle)
    }

    fn model_query() -> FeederQuery {
        let mut query = FeederQuery::new("http://blazegraph:8080/bigdata/namespace/kb/sparql");
        query.add_feeder_selection("_49AD8E07");
        query
    }

    #[test]
    fn test_importer_response_is_copied_to_output() {
        let dictionary = r#"{"feeders":[]}"#;
        let (url, server) = serve_once("200 OK", dictionary);
        let generator = HttpDictionaryGenerator::new(Some(url), Duration::from_secs(5));

        let mut out = Vec::new();
        generator.generate_dictionary(&model_query(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), dictionary);

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /dict "));
        let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(
            body["endpoint"],
            "http://blazegraph:8080/bigdata/namespace/kb/sparql"
        );
        assert_eq!(body["feeders"], serde_json::json!(["_49AD8E07"]));
        assert_eq!(body["selection"], "VALUES ?fdrid {\"_49AD8E07\"}");
    }

    #[test]
    fn test_importer_error_status_writes_nothing() {
        let (url, server) = serve_once("500 Internal Server Error", "boom");
        let generator = HttpDictionaryGenerator::new(Some(url), Duration::from_secs(5));

        let mut out = Vec::new();
        let err = generator.generate_dictionary(&model_query(), &mut out).unwrap_err();
        server.join().unwrap();

        assert_eq!(err.error_code(), "DICTIONARY_ACQUISITION");
        assert!(err.to_string().contains("importer responded with 500"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_unreachable_importer() {
        let addr = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let generator = HttpDictionaryGenerator::new(
            Some(format!("http://{}/dict", addr)),
            Duration::from_secs(5),
        );

        let mut out = Vec::new();
        let err = generator.generate_dictionary(&model_query(), &mut out).unwrap_err();
        assert_eq!(err.error_code(), "DICTIONARY_ACQUISITION");
        assert!(out.is_empty());
    }

    #[test]
    fn test_feeder_selection() {
        let mut query = FeederQuery::new("http://blazegraph:8080/bigdata/namespace/kb/sparql");
        query.add_feeder_selection("_49AD8E07-3BF9-A4E2-CB8F-C3722F837B62");
        query.add_feeder_selection("_49AD8E07-3BF9-A4E2-CB8F-C3722F837B62");
        assert_eq!(query.feeders().len(), 1);
        assert_eq!(
            query.selection_clause(),
            "VALUES ?fdrid {\"_49AD8E07-3BF9-A4E2-CB8F-C3722F837B62\"}"
        );
    }

    #[test]
    fn test_selection_clause_escapes_quotes() {
        let mut query = FeederQuery::new("http://localhost/sparql");
        query.add_feeder_selection("a\"b");
        query.add_feeder_selection("c");
        assert_eq!(query.selection_clause(), "VALUES ?fdrid {\"a\\\"b\" \"c\"}");
    }

    #[test]
    fn test_unconfigured_importer_fails_without_network() {
        let generator = HttpDictionaryGenerator::new(Some("  ".into()), Duration::from_secs(1));
        assert!(generator.url().is_none());

        let mut query = FeederQuery::new("http://localhost/sparql");
        query.add_feeder_selection("model");
        let mut out = Vec::new();
        let err = generator.generate_dictionary(&query, &mut out).unwrap_err();
        assert_eq!(err.error_code(), "DICTIONARY_ACQUISITION");
        assert!(out.is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = ImporterConfig {
            url: Some("http://importer:8090/dictionary".into()),
            timeout_secs: 5,
        };
        let generator = HttpDictionaryGenerator::from_config(&config);
        assert_eq!(generator.url(), Some("http://importer:8090/dictionary"));
    }
}
