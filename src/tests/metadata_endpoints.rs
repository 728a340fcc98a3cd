// count (HEAD + record count header), DDL and field docs.

#[cfg(test)]
mod test {
    use anyhow::Result;
    use httpmock::Method::{GET, HEAD, POST};
    use httpmock::MockServer;

    use crate::tests::common::{json, token_body, v2_config, V2_PATH};
    use crate::{DirectAccess, QueryOptions, SchemaDialect};

    async fn client(server: &MockServer) -> Result<DirectAccess> {
        server
            .mock_async(|when, then| {
                when.method(POST).path(format!("{}/tokens", V2_PATH));
                then.status(200).json_body(token_body("tok-1"));
            })
            .await;
        Ok(DirectAccess::new(v2_config(&server.base_url())).await?)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn count_reads_record_count_header() -> Result<()> {
        let server = MockServer::start_async().await;
        let head = server
            .mock_async(|when, then| {
                when.method(HEAD)
                    .path(format!("{}/rigs", V2_PATH))
                    .query_param("deleteddate", "null")
                    .header("authorization", "bearer tok-1");
                then.status(200).header("X-QUERY-RECORD-COUNT", "42");
            })
            .await;

        let mut client = client(&server).await?;
        let options = QueryOptions::new().with("deleteddate", "null");
        assert_eq!(client.count("rigs", &options).await?, 42);
        // no side effects, same answer twice
        assert_eq!(client.count("rigs", &options).await?, 42);
        assert_eq!(head.hits_async().await, 2);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn count_errors() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(HEAD).path(format!("{}/bogus", V2_PATH));
                then.status(404);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(HEAD).path(format!("{}/rigs", V2_PATH));
                then.status(200);
            })
            .await;

        let mut client = client(&server).await?;
        assert!(client.count("bogus", &QueryOptions::new()).await.unwrap_err().is_dataset_error());
        let err = client.count("rigs", &QueryOptions::new()).await.unwrap_err();
        assert!(err.is_query_error());
        assert!(err.to_string().contains("X-QUERY-RECORD-COUNT"));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn schema_returns_ddl_text() -> Result<()> {
        let server = MockServer::start_async().await;
        let ddl = "CREATE TABLE rigs (\n  RigID INTEGER,\n  RigName TEXT\n);";
        let pg = server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{}/rigs", V2_PATH)).query_param("ddl", "pg");
                then.status(200).body(ddl);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{}/rigs", V2_PATH)).query_param("ddl", "mssql");
                then.status(200).body("CREATE TABLE [rigs] ([RigID] INT);");
            })
            .await;

        let mut client = client(&server).await?;
        assert_eq!(client.schema("rigs", "pg").await?, ddl);
        assert!(client
            .schema_for("rigs", SchemaDialect::Mssql)
            .await?
            .starts_with("CREATE TABLE [rigs]"));

        let err = client.ddl("rigs", "invalid").await.unwrap_err();
        assert!(err.is_query_error());
        assert_eq!(pg.hits_async().await, 1);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn docs_are_optional() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(format!("{}/well-origins", V2_PATH))
                    .query_param("docs", "true");
                then.status(200).json_body(json!([
                    {"name": "UWI", "type": "string", "description": "unique well identifier"},
                    {"name": "SpudDate", "type": "date", "description": null}
                ]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{}/rigs", V2_PATH)).query_param("docs", "true");
                then.status(501).body("Not Implemented");
            })
            .await;

        let mut client = client(&server).await?;
        let docs = client.docs("well-origins").await?.expect("docs");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].get("name"), Some(&json!("UWI")));

        assert_eq!(client.docs("rigs").await?, None);
        Ok(())
    }
}
