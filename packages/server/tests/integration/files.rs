use file_server::config::FilesConfig;

use crate::common::{MAX_BLOB_SIZE, TestApp, TestFile, routes};

mod upload {
    use super::*;

    #[tokio::test]
    async fn stores_single_file_and_returns_record() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(
                7,
                "AVATAR",
                vec![TestFile::typed("a.png", vec![1u8; 1024], "image/png")],
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["total"].as_u64().unwrap(), 1);
        let record = &res.body["files"][0];
        assert!(record["id"].as_i64().unwrap() > 0);
        assert_eq!(record["owner_id"].as_i64().unwrap(), 7);
        assert_eq!(record["category"].as_str().unwrap(), "AVATAR");
        assert_eq!(record["size"].as_i64().unwrap(), 1024);
        assert_eq!(record["original_filename"].as_str().unwrap(), "a.png");
        assert_eq!(record["content_type"].as_str().unwrap(), "image/png");

        let filename = record["filename"].as_str().unwrap();
        assert_ne!(filename, "a.png");
        assert!(filename.ends_with("_a.png"));
        assert_eq!(app.stored_blobs().len(), 1);
    }

    #[tokio::test]
    async fn stores_every_part_in_order() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(
                3,
                "attachment",
                vec![
                    TestFile::new("one.txt", b"1".to_vec()),
                    TestFile::new("two.txt", b"22".to_vec()),
                    TestFile::new("three.txt", b"333".to_vec()),
                ],
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let names: Vec<_> = res.body["files"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["original_filename"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["one.txt", "two.txt", "three.txt"]);
        assert_eq!(app.repo.len().await, 3);
    }

    #[tokio::test]
    async fn missing_content_type_defaults_to_octet_stream() {
        let app = TestApp::spawn().await;

        let record = app.upload_one(1, "COVER", "blob.bin", b"data").await;

        assert_eq!(
            record["content_type"].as_str().unwrap(),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn duplicate_name_for_owner_is_conflict() {
        let app = TestApp::spawn().await;
        app.upload_one(3, "COVER", "cover.png", b"first").await;

        let res = app
            .upload(3, "COVER", vec![TestFile::new("cover.png", b"second".to_vec())])
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
        assert_eq!(
            res.body["message"],
            "File with name 'cover.png' already exists for owner 3"
        );
        assert_eq!(app.stored_blobs().len(), 1);
        assert_eq!(app.repo.len().await, 1);
    }

    #[tokio::test]
    async fn duplicate_check_can_be_disabled() {
        let app = TestApp::spawn_with(FilesConfig {
            duplicate_check: false,
            ..FilesConfig::default()
        })
        .await;

        let first = app.upload_one(3, "COVER", "cover.png", b"first").await;
        let second = app.upload_one(3, "COVER", "cover.png", b"second").await;

        assert_ne!(first["filename"], second["filename"]);
        assert_eq!(app.stored_blobs().len(), 2);
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(1, "AVATAR", vec![TestFile::new("empty.png", Vec::<u8>::new())])
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.stored_blobs().is_empty());
        assert!(app.repo.is_empty().await);
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(
                1,
                "AVATAR",
                vec![TestFile::new("big.png", vec![0u8; MAX_BLOB_SIZE as usize + 1])],
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.stored_blobs().is_empty());
    }

    #[tokio::test]
    async fn invalid_slot_query_is_rejected() {
        let app = TestApp::spawn().await;

        for (owner_id, category) in [(0, "COVER"), (-1, "COVER"), (1, "POSTER")] {
            let res = app
                .upload(owner_id, category, vec![TestFile::new("a.png", b"x".to_vec())])
                .await;
            assert_eq!(res.status, 400, "owner {owner_id} category {category}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
        assert!(app.stored_blobs().is_empty());
    }

    #[tokio::test]
    async fn request_without_file_parts_is_rejected() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new().text("note", "no files here");
        let res = app
            .client
            .post(format!(
                "http://{}{}",
                app.addr,
                routes::slot_query(1, "COVER")
            ))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn too_many_parts_are_rejected() {
        let app = TestApp::spawn_with(FilesConfig {
            max_files_per_request: 2,
            ..FilesConfig::default()
        })
        .await;

        let res = app
            .upload(
                1,
                "ATTACHMENT",
                vec![
                    TestFile::new("a.txt", b"a".to_vec()),
                    TestFile::new("b.txt", b"b".to_vec()),
                    TestFile::new("c.txt", b"c".to_vec()),
                ],
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(app.stored_blobs().is_empty());
    }
}

mod download {
    use super::*;

    #[tokio::test]
    async fn streams_bytes_as_attachment() {
        let app = TestApp::spawn().await;
        let record = app.upload_one(7, "COVER", "cover.png", b"PNG_DATA").await;
        let filename = record["filename"].as_str().unwrap();

        let res = app.get_raw(&routes::file(filename)).await;

        assert_eq!(res.status().as_u16(), 200);
        let headers = res.headers().clone();
        assert_eq!(headers["content-type"], "image/png");
        assert_eq!(headers["content-length"], "8");
        let disposition = headers["content-disposition"].to_str().unwrap();
        assert!(disposition.starts_with("attachment;"));
        assert!(disposition.contains(filename));

        assert_eq!(res.bytes().await.unwrap().as_ref(), b"PNG_DATA");
    }

    #[tokio::test]
    async fn unknown_file_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::file("nonexistent.png")).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert_eq!(res.body["message"], "File not found: nonexistent.png");
    }

    #[tokio::test]
    async fn traversal_names_are_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::file("..%2F..%2Fetc%2Fpasswd")).await;

        assert_eq!(res.status, 404);
    }
}

mod query {
    use super::*;

    #[tokio::test]
    async fn lists_slot_files() {
        let app = TestApp::spawn().await;
        app.upload_one(5, "ATTACHMENT", "a.txt", b"a").await;
        app.upload_one(5, "ATTACHMENT", "b.txt", b"b").await;
        app.upload_one(5, "COVER", "c.png", b"c").await;
        app.upload_one(6, "ATTACHMENT", "d.txt", b"d").await;

        let res = app.get(&routes::slot("attachment", 5)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"].as_u64().unwrap(), 2);
        let files = res.body["files"].as_array().unwrap();
        assert_eq!(files[0]["original_filename"], "a.txt");
        assert_eq!(files[1]["original_filename"], "b.txt");
    }

    #[tokio::test]
    async fn empty_slot_lists_nothing() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::slot("Cover", 99)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"].as_u64().unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::slot("poster", 1)).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn gets_record_by_id() {
        let app = TestApp::spawn().await;
        let record = app.upload_one(2, "AVATAR", "me.jpg", b"jpeg").await;
        let id = record["id"].as_i64().unwrap();

        let res = app.get(&routes::file_by_id(id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.id(), id);
        assert_eq!(res.body, record);
    }

    #[tokio::test]
    async fn missing_id_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::file_by_id(12345)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "File not found with ID: 12345");
    }

    #[tokio::test]
    async fn non_numeric_id_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get("/api/v1/files/id/abc").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn deletes_by_filename() {
        let app = TestApp::spawn().await;
        let record = app.upload_one(1, "COVER", "c.png", b"cover").await;
        let filename = record["filename"].as_str().unwrap();

        let res = app.delete(&routes::file(filename)).await;
        assert_eq!(res.status, 204);

        assert_eq!(app.get(&routes::file(filename)).await.status, 404);
        assert!(app.stored_blobs().is_empty());
        assert!(app.repo.is_empty().await);
    }

    #[tokio::test]
    async fn deletes_by_id() {
        let app = TestApp::spawn().await;
        let record = app.upload_one(1, "AVATAR", "a.png", b"avatar").await;
        let id = record["id"].as_i64().unwrap();
        let filename = record["filename"].as_str().unwrap();

        let res = app.delete(&routes::file_by_id(id)).await;
        assert_eq!(res.status, 204);

        assert_eq!(app.get(&routes::file_by_id(id)).await.status, 404);
        assert_eq!(app.get(&routes::file(filename)).await.status, 404);
    }

    #[tokio::test]
    async fn deleting_unknown_file_is_not_found() {
        let app = TestApp::spawn().await;

        assert_eq!(app.delete(&routes::file("ghost.png")).await.status, 404);
        assert_eq!(app.delete(&routes::file_by_id(77)).await.status, 404);
    }

    #[tokio::test]
    async fn deletes_whole_slot_only() {
        let app = TestApp::spawn().await;
        app.upload_one(4, "ATTACHMENT", "a.txt", b"a").await;
        app.upload_one(4, "ATTACHMENT", "b.txt", b"b").await;
        app.upload_one(4, "COVER", "c.png", b"c").await;

        let res = app.delete(&routes::slot("ATTACHMENT", 4)).await;
        assert_eq!(res.status, 204);

        let listed = app.get(&routes::slot("ATTACHMENT", 4)).await;
        assert_eq!(listed.body["total"].as_u64().unwrap(), 0);
        let covers = app.get(&routes::slot("COVER", 4)).await;
        assert_eq!(covers.body["total"].as_u64().unwrap(), 1);
        assert_eq!(app.stored_blobs().len(), 1);
    }

    #[tokio::test]
    async fn deleting_empty_slot_succeeds() {
        let app = TestApp::spawn().await;

        let res = app.delete(&routes::slot("AVATAR", 8)).await;

        assert_eq!(res.status, 204);
    }
}

mod replace {
    use super::*;

    #[tokio::test]
    async fn replaces_slot_contents() {
        let app = TestApp::spawn().await;
        let old = app.upload_one(7, "AVATAR", "old.png", b"old").await;

        let res = app
            .replace(7, "AVATAR", vec![TestFile::new("new.png", b"new".to_vec())])
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["total"].as_u64().unwrap(), 1);
        assert_eq!(res.body["files"][0]["original_filename"], "new.png");

        let listed = app.get(&routes::slot("AVATAR", 7)).await;
        assert_eq!(listed.body["files"], res.body["files"]);

        let old_name = old["filename"].as_str().unwrap();
        assert_eq!(app.get(&routes::file(old_name)).await.status, 404);
        assert_eq!(app.stored_blobs().len(), 1);
    }

    #[tokio::test]
    async fn can_reupload_same_name() {
        let app = TestApp::spawn().await;
        app.upload_one(7, "COVER", "cover.png", b"v1").await;

        let res = app
            .replace(7, "COVER", vec![TestFile::new("cover.png", b"v2".to_vec())])
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let filename = res.body["files"][0]["filename"].as_str().unwrap().to_string();
        let body = app.get_raw(&routes::file(&filename)).await.bytes().await.unwrap();
        assert_eq!(body.as_ref(), b"v2");
    }
}

#[tokio::test]
async fn serves_openapi_document() {
    let app = TestApp::spawn().await;

    let res = app.get("/api-docs/openapi.json").await;

    assert_eq!(res.status, 200);
    let paths = res.body["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/v1/files/id/{id}"));
    assert!(paths.contains_key("/api/v1/files/{category}/{owner_id}"));
}
