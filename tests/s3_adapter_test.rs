#![cfg(feature = "s3")]

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use httpmock::prelude::*;
use s3_controller::core::scanner::scan_files_in_bucket_by_regex;
use s3_controller::{ControllerError, KeyOption, ObjectStore, S3ObjectStore};

fn store_for(server: &MockServer) -> S3ObjectStore {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new("test", "test", None, None, "static"))
        .endpoint_url(server.base_url())
        .force_path_style(true)
        .build();
    S3ObjectStore::from_client(aws_sdk_s3::Client::from_conf(config))
}

const LISTING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>reports</Name>
  <Prefix>daily/</Prefix>
  <KeyCount>3</KeyCount>
  <MaxKeys>1000</MaxKeys>
  <IsTruncated>false</IsTruncated>
  <Contents><Key>daily/</Key><Size>0</Size></Contents>
  <Contents><Key>daily/menu2160-20240102.csv</Key><Size>12</Size></Contents>
  <Contents><Key>daily/notes.txt</Key><Size>4</Size></Contents>
</ListBucketResult>"#;

#[tokio::test]
async fn test_list_objects_and_scan_by_regex() {
    let server = MockServer::start_async().await;
    let list_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/reports")
                .query_param("list-type", "2")
                .query_param("prefix", "daily/");
            then.status(200)
                .header("Content-Type", "application/xml")
                .body(LISTING);
        })
        .await;

    let store = store_for(&server);
    let objects = store.list_objects("reports", "daily/").await.unwrap();
    assert_eq!(objects.len(), 3);
    assert_eq!(objects[1].key, "daily/menu2160-20240102.csv");
    assert_eq!(objects[1].size, 12);

    let names = scan_files_in_bucket_by_regex(&store, "reports", "daily", r"\.csv$", KeyOption::Name)
        .await
        .unwrap();
    assert_eq!(names, vec!["menu2160-20240102.csv"]);

    list_mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_get_object_returns_body() {
    let server = MockServer::start_async().await;
    let get_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/reports/daily/a.csv");
            then.status(200)
                .header("Content-Type", "text/csv")
                .body("ticker,close\nAAA,1\n");
        })
        .await;

    let store = store_for(&server);
    let body = store.get_object("reports", "daily/a.csv").await.unwrap();
    assert_eq!(body, b"ticker,close\nAAA,1\n");
    get_mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_key_maps_to_object_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/reports/absent.csv");
            then.status(404)
                .header("Content-Type", "application/xml")
                .body(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                     <Error><Code>NoSuchKey</Code>\
                     <Message>The specified key does not exist.</Message>\
                     <Key>absent.csv</Key></Error>",
                );
        })
        .await;

    let store = store_for(&server);
    let err = store.get_object("reports", "absent.csv").await.unwrap_err();
    match err {
        ControllerError::ObjectNotFound { bucket, key } => {
            assert_eq!(bucket, "reports");
            assert_eq!(key, "absent.csv");
        }
        other => panic!("expected ObjectNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_access_denied_maps_to_storage_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/reports/locked.csv");
            then.status(403)
                .header("Content-Type", "application/xml")
                .body(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                     <Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>",
                );
        })
        .await;

    let store = store_for(&server);
    let err = store.delete_object("reports", "locked.csv").await.unwrap_err();
    assert!(matches!(
        err,
        ControllerError::StorageError { ref operation, .. } if operation == "delete_object"
    ));
}

#[tokio::test]
async fn test_rejected_access_key_maps_to_credentials_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/reports/a.csv");
            then.status(403)
                .header("Content-Type", "application/xml")
                .body(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                     <Error><Code>InvalidAccessKeyId</Code>\
                     <Message>The AWS Access Key Id you provided does not exist in our records.</Message>\
                     </Error>",
                );
        })
        .await;

    let store = store_for(&server);
    let err = store.get_object("reports", "a.csv").await.unwrap_err();
    assert!(matches!(err, ControllerError::CredentialsError { .. }));
}

#[tokio::test]
async fn test_copy_object_sends_encoded_copy_source() {
    let server = MockServer::start_async().await;
    let copy_mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/archive/2024/a.csv")
                .header("x-amz-copy-source", "raw/daily/a%20b.csv");
            then.status(200)
                .header("Content-Type", "application/xml")
                .body(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                     <CopyObjectResult><ETag>\"abc\"</ETag></CopyObjectResult>",
                );
        })
        .await;

    let store = store_for(&server);
    store
        .copy_object("raw", "daily/a b.csv", "archive", "2024/a.csv")
        .await
        .unwrap();
    copy_mock.assert_async().await;
}
