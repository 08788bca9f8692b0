use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use wreq::{Client, RequestBuilder};
use wreq_util::Emulation;

use super::{ExportSink, ExportTable};
use crate::config::ExportSection;

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Spreadsheet {
    spreadsheet_id: String,
    #[serde(default)]
    spreadsheet_url: String,
    #[serde(default)]
    sheets: Vec<Sheet>,
}

impl Spreadsheet {
    fn first_sheet_title(&self) -> &str {
        self.sheets
            .first()
            .map(|s| s.properties.title.as_str())
            .unwrap_or("Sheet1")
    }
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// Writes tables into Google Sheets spreadsheets looked up by name.
pub struct GoogleSheetsSink {
    client: Client,
    sheets_endpoint: String,
    drive_endpoint: String,
    access_token: String,
}

impl GoogleSheetsSink {
    pub fn new(config: &ExportSection, access_token: String) -> Result<Self> {
        let client = Client::builder()
            .emulation(Emulation::Firefox136)
            .build()?;

        Ok(GoogleSheetsSink {
            client,
            sheets_endpoint: config.sheets_endpoint.trim_end_matches('/').to_string(),
            drive_endpoint: config.drive_endpoint.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Value> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.access_token))
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", what))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("{} failed with HTTP {}: {}", what, status, body));
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", what))
    }

    async fn find_spreadsheet(&self, name: &str) -> Result<Option<String>> {
        let request = self
            .client
            .get(format!("{}/files", self.drive_endpoint))
            .query(&[
                ("q", drive_query(name)),
                ("fields", "files(id,name)".to_string()),
                ("pageSize", "1".to_string()),
            ]);

        let list: DriveFileList = serde_json::from_value(self.send(request, "spreadsheet lookup").await?)?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn create_spreadsheet(&self, name: &str) -> Result<Spreadsheet> {
        let request = self
            .client
            .post(format!("{}/spreadsheets", self.sheets_endpoint))
            .json(&json!({ "properties": { "title": name } }));

        Ok(serde_json::from_value(self.send(request, "spreadsheet create").await?)?)
    }

    async fn get_spreadsheet(&self, id: &str) -> Result<Spreadsheet> {
        let request = self
            .client
            .get(format!("{}/spreadsheets/{}", self.sheets_endpoint, id))
            .query(&[("fields", "spreadsheetId,spreadsheetUrl,sheets.properties.title")]);

        Ok(serde_json::from_value(self.send(request, "spreadsheet fetch").await?)?)
    }

    async fn clear_sheet(&self, id: &str, title: &str) -> Result<()> {
        let request = self
            .client
            .post(format!("{}/spreadsheets/{}/values:batchClear", self.sheets_endpoint, id))
            .json(&json!({ "ranges": [quote_sheet(title)] }));

        self.send(request, "sheet clear").await?;
        Ok(())
    }

    async fn write_values(&self, id: &str, title: &str, table: &ExportTable) -> Result<()> {
        let request = self
            .client
            .post(format!("{}/spreadsheets/{}/values:batchUpdate", self.sheets_endpoint, id))
            .json(&values_payload(title, table));

        self.send(request, "sheet update").await?;
        Ok(())
    }
}

#[async_trait]
impl ExportSink for GoogleSheetsSink {
    async fn write_table(&self, sheet_name: &str, table: &ExportTable) -> Result<String> {
        let spreadsheet = match self.find_spreadsheet(sheet_name).await? {
            Some(id) => {
                let spreadsheet = self.get_spreadsheet(&id).await?;
                info!("Updating existing spreadsheet: {}", spreadsheet.spreadsheet_url);
                spreadsheet
            }
            None => {
                let spreadsheet = self.create_spreadsheet(sheet_name).await?;
                info!("New spreadsheet created: {}", spreadsheet.spreadsheet_url);
                spreadsheet
            }
        };

        let title = spreadsheet.first_sheet_title();
        self.clear_sheet(&spreadsheet.spreadsheet_id, title).await?;
        self.write_values(&spreadsheet.spreadsheet_id, title, table).await?;

        Ok(spreadsheet.spreadsheet_url)
    }
}

fn drive_query(name: &str) -> String {
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        name.replace('\\', "\\\\").replace('\'', "\\'"),
        SPREADSHEET_MIME
    )
}

fn quote_sheet(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn values_payload(title: &str, table: &ExportTable) -> Value {
    json!({
        "valueInputOption": "RAW",
        "data": [{
            "range": format!("{}!A1", quote_sheet(title)),
            "majorDimension": "ROWS",
            "values": table.to_values(),
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_query_escapes_quotes() {
        assert_eq!(
            drive_query("kid's_laptop_Targeted_Results_20250101_000000"),
            "name = 'kid\\'s_laptop_Targeted_Results_20250101_000000' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false"
        );
    }

    #[test]
    fn test_values_payload() {
        let table = ExportTable {
            headers: vec!["name".to_string(), "price".to_string()],
            rows: vec![vec!["Lomi".to_string(), "499".to_string()]],
        };

        let payload = values_payload("Sheet1", &table);
        assert_eq!(payload["valueInputOption"], "RAW");
        assert_eq!(payload["data"][0]["range"], "'Sheet1'!A1");
        assert_eq!(payload["data"][0]["values"][0][1], "price");
        assert_eq!(payload["data"][0]["values"][1][0], "Lomi");
    }

    #[test]
    fn test_spreadsheet_response_parsing() {
        let spreadsheet: Spreadsheet = serde_json::from_value(json!({
            "spreadsheetId": "abc123",
            "spreadsheetUrl": "https://docs.google.com/spreadsheets/d/abc123/edit",
            "sheets": [{"properties": {"title": "Лист1", "sheetId": 0}}]
        }))
        .unwrap();

        assert_eq!(spreadsheet.spreadsheet_id, "abc123");
        assert_eq!(spreadsheet.first_sheet_title(), "Лист1");
        assert_eq!(quote_sheet("it's"), "'it''s'");
    }

    #[test]
    fn test_missing_sheets_defaults_title() {
        let spreadsheet: Spreadsheet =
            serde_json::from_value(json!({"spreadsheetId": "x"})).unwrap();
        assert_eq!(spreadsheet.first_sheet_title(), "Sheet1");
    }
}
