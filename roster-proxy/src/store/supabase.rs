use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{RequestBuilder, Response};
use roster_parser::{CalendarEvent, DateRange, EventPatch, NewEvent};
use serde::Serialize;

use super::{EventStore, StoreError};

const TABLE: &str = "calendars";

/// Events kept in a Supabase table through its PostgREST interface.
pub struct SupabaseStore {
    http: reqwest::Client,
    table_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct InsertRow<'a> {
    date: NaiveDate,
    title: &'a str,
    category: Option<&'a str>,
    description: Option<&'a str>,
}

impl SupabaseStore {
    pub fn new(url: &str, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            table_url: format!("{}/rest/v1/{TABLE}", url.trim_end_matches('/')),
            api_key: api_key.into(),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn rows(response: Response) -> Result<Vec<CalendarEvent>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl EventStore for SupabaseStore {
    async fn list(&self, range: DateRange) -> Result<Vec<CalendarEvent>, StoreError> {
        let request = self.http.get(&self.table_url).query(&[
            ("select", "*".to_string()),
            ("order", "date.asc".to_string()),
            ("date", format!("gte.{}", range.start)),
            ("date", format!("lte.{}", range.end)),
        ]);

        let response = self.authorized(request).send().await?;
        Self::rows(response).await
    }

    async fn insert(&self, event: NewEvent) -> Result<CalendarEvent, StoreError> {
        let row = InsertRow {
            date: event.date,
            title: &event.title,
            category: event.category.as_deref(),
            description: event.description.as_deref(),
        };

        let request = self
            .http
            .post(&self.table_url)
            .header("Prefer", "return=representation")
            .json(&[row]);

        let response = self.authorized(request).send().await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::EmptyResponse)
    }

    async fn update(&self, id: &str, patch: EventPatch) -> Result<CalendarEvent, StoreError> {
        let request = self
            .http
            .patch(&self.table_url)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&patch);

        let response = self.authorized(request).send().await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let request = self
            .http
            .delete(&self.table_url)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation");

        let response = self.authorized(request).send().await?;
        if Self::rows(response).await?.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn row(id: &str, date: &str, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "date": date,
            "title": title,
            "category": "근무표",
            "description": null,
            "created_at": "2026-01-01T00:00:00+00:00",
            "updated_at": "2026-01-01T00:00:00+00:00"
        })
    }

    #[tokio::test]
    async fn lists_rows_in_range() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/calendars"))
            .and(header("apikey", "anon"))
            .and(header("Authorization", "Bearer anon"))
            .and(query_param("order", "date.asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                row("a", "2026-01-01", "휴무"),
                row("b", "2026-01-02", "근무"),
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let store = SupabaseStore::new(&mock_server.uri(), "anon");
        let events = store.list(DateRange::default()).await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id.as_deref(), Some("a"));
        assert_eq!(events[1].title, "근무");

        let requests = mock_server.received_requests().await.unwrap();
        let query = requests[0].url.query().unwrap_or_default().to_string();
        assert!(query.contains("date=gte.2026-01-01"));
        assert!(query.contains("date=lte.2026-12-31"));
    }

    #[tokio::test]
    async fn inserts_with_nulls_for_missing_fields() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/calendars"))
            .and(header("Prefer", "return=representation"))
            .and(body_json(json!([{
                "date": "2026-03-03",
                "title": "근무",
                "category": null,
                "description": null
            }])))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([row(
                "new-id",
                "2026-03-03",
                "근무"
            )])))
            .mount(&mock_server)
            .await;

        let store = SupabaseStore::new(&mock_server.uri(), "anon");
        let event = store
            .insert(NewEvent {
                date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
                title: "근무".into(),
                description: None,
                category: None,
            })
            .await
            .unwrap();

        assert_eq!(event.id.as_deref(), Some("new-id"));
    }

    #[tokio::test]
    async fn update_of_unknown_row_is_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/calendars"))
            .and(query_param("id", "eq.nope"))
            .and(body_json(json!({ "title": "휴무" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;

        let store = SupabaseStore::new(&mock_server.uri(), "anon");
        let result = store
            .update(
                "nope",
                EventPatch {
                    title: Some("휴무".into()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(StoreError::NotFound(id)) if id == "nope"));
    }

    #[tokio::test]
    async fn deletes_by_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/rest/v1/calendars"))
            .and(query_param("id", "eq.a"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([row("a", "2026-01-01", "휴무")])),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let store = SupabaseStore::new(&mock_server.uri(), "anon");
        store.delete("a").await.unwrap();
    }

    #[tokio::test]
    async fn surfaces_rejections() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&mock_server)
            .await;

        let store = SupabaseStore::new(&mock_server.uri(), "wrong");
        let result = store
            .insert(NewEvent {
                date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
                title: "근무".into(),
                description: None,
                category: None,
            })
            .await;

        assert!(matches!(
            result,
            Err(StoreError::Rejected { status: 401, .. })
        ));
    }
}
