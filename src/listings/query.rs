//! Query builders for the listings table

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;
use crate::fetch::{Fetch, FetchBuilder};
use crate::listings::filter::{Filter, FilterOperator};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Handle on one table of the REST API
#[derive(Debug, Clone)]
pub struct Table {
    /// Full URL of the table endpoint
    url: String,

    /// The anonymous API key
    key: String,

    /// Value of the `X-Client-Info` header
    client_info: String,

    /// Token sent as bearer; the anon key when nobody is signed in
    bearer: Option<String>,

    /// HTTP client
    client: Client,
}

impl Table {
    pub fn new(base_url: &str, key: &str, table: &str, client: Client, client_info: &str) -> Self {
        Self {
            url: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            key: key.to_string(),
            client_info: client_info.to_string(),
            bearer: None,
            client,
        }
    }

    /// Send requests on behalf of a signed-in user
    pub fn with_auth(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn prepare<'a>(&self, fetch: FetchBuilder<'a>) -> FetchBuilder<'a> {
        let bearer = self.bearer.as_deref().unwrap_or(&self.key);
        fetch
            .header("apikey", &self.key)
            .header("X-Client-Info", &self.client_info)
            .bearer_auth(bearer)
    }

    /// Select specific columns from the table
    pub fn select(&self, columns: &str) -> SelectBuilder {
        SelectBuilder {
            table: self.clone(),
            params: vec![("select".to_string(), columns.to_string())],
        }
    }

    /// Insert rows into the table
    pub fn insert<T: Serialize>(&self, values: T) -> InsertBuilder<T> {
        InsertBuilder {
            table: self.clone(),
            values,
        }
    }

    /// Delete rows from the table
    pub fn delete(&self) -> DeleteBuilder {
        DeleteBuilder {
            table: self.clone(),
            params: Vec::new(),
        }
    }
}

/// Builder for SELECT queries
pub struct SelectBuilder {
    table: Table,
    params: Vec<(String, String)>,
}

impl SelectBuilder {
    /// Add a filter condition
    pub fn filter(mut self, filter: &Filter) -> Self {
        self.params.push(filter.to_param());
        self
    }

    /// Filter rows where column equals a value
    pub fn eq(self, column: &str, value: &str) -> Self {
        self.filter(&Filter::new(column, FilterOperator::Eq, value))
    }

    /// Filter rows where column is greater than or equal to a value
    pub fn gte(self, column: &str, value: &str) -> Self {
        self.filter(&Filter::new(column, FilterOperator::Gte, value))
    }

    /// Filter rows where column is less than a value
    pub fn lt(self, column: &str, value: &str) -> Self {
        self.filter(&Filter::new(column, FilterOperator::Lt, value))
    }

    /// Order the results by a column
    pub fn order(mut self, column: &str, order: SortOrder) -> Self {
        self.params
            .push(("order".to_string(), format!("{}.{}", column, order.as_str())));
        self
    }

    /// Limit the number of rows returned
    pub fn limit(mut self, count: usize) -> Self {
        self.params.retain(|(key, _)| key != "limit");
        self.params.push(("limit".to_string(), count.to_string()));
        self
    }

    /// Query parameters in the order they will be sent
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Execute the query and return the results
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let fetch = Fetch::get(&self.table.client, &self.table.url).query(&self.params);
        let rows = self.table.prepare(fetch).execute::<Vec<T>>().await?;
        Ok(rows)
    }

    /// Execute the query and return the first row
    pub async fn execute_one<T: DeserializeOwned>(self) -> Result<Option<T>> {
        let rows = self.limit(1).execute::<T>().await?;
        Ok(rows.into_iter().next())
    }
}

/// Builder for INSERT queries
pub struct InsertBuilder<T: Serialize> {
    table: Table,
    values: T,
}

impl<T: Serialize> InsertBuilder<T> {
    /// Execute the insert and return the stored rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>> {
        let fetch = Fetch::post(&self.table.client, &self.table.url)
            .header("Prefer", "return=representation")
            .json(&self.values)?;
        let rows = self.table.prepare(fetch).execute::<Vec<R>>().await?;
        Ok(rows)
    }
}

/// Builder for DELETE queries
pub struct DeleteBuilder {
    table: Table,
    params: Vec<(String, String)>,
}

impl DeleteBuilder {
    /// Filter rows where column equals a value
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.params
            .push(Filter::new(column, FilterOperator::Eq, value).to_param());
        self
    }

    /// Execute the delete
    pub async fn execute(&self) -> Result<()> {
        let fetch = Fetch::delete(&self.table.client, &self.table.url)
            .header("Prefer", "return=minimal")
            .query(&self.params);
        self.table.prepare(fetch).execute_checked().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            "https://cars.example.com/",
            "anon",
            "cars",
            Client::new(),
            "carmarket/test",
        )
    }

    #[test]
    fn table_url_joins_rest_path() {
        assert_eq!(table().url(), "https://cars.example.com/rest/v1/cars");
    }

    #[test]
    fn select_keeps_parameter_order() {
        let query = table()
            .select("*")
            .gte("name", "ONIX")
            .lt("name", "ONIX\u{f8ff}")
            .order("name", SortOrder::Ascending);

        let keys: Vec<&str> = query.params().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["select", "name", "name", "order"]);
        assert_eq!(query.params()[3].1, "name.asc");
    }

    #[test]
    fn limit_replaces_previous_limit() {
        let query = table().select("*").limit(5).limit(1);
        let limits: Vec<&(String, String)> =
            query.params().iter().filter(|(k, _)| k == "limit").collect();
        assert_eq!(limits.len(), 1);
        assert_eq!(limits[0].1, "1");
    }
}
