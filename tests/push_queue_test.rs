#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use httpmock::Method::PUT;
    use httpmock::MockServer;
    use pagedrop::{ContentRequest, Destination, PushError, PushQueue};
    use serde_json::json;
    use std::time::{Duration, Instant};

    fn destination(server: &MockServer) -> Destination {
        Destination {
            base_url: server.base_url(),
            user: "alice".into(),
            repo: "captures".into(),
            token: "secret".into(),
        }
    }

    fn request(content: &'static [u8]) -> ContentRequest {
        ContentRequest {
            content: Bytes::from_static(content),
            message: "save page".into(),
            branch: "main".into(),
        }
    }

    #[tokio::test]
    async fn test_successful_push_sends_base64_body_and_headers() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/repos/alice/captures/contents/page.html")
                    .header("authorization", "token secret")
                    .header("accept", "application/vnd.github.v3+json")
                    .json_body(json!({
                        // base64 of "hello world"
                        "content": "aGVsbG8gd29ybGQ=",
                        "message": "save page",
                        "branch": "main",
                    }));
                then.status(201).json_body(json!({
                    "content": { "path": "page.html", "sha": "abc123" },
                    "commit": { "sha": "def456" },
                }));
            })
            .await;

        let queue = PushQueue::default();
        let handle = queue.push(
            destination(&server),
            "page.html".into(),
            request(b"hello world"),
        );
        let status = handle.join().await?;

        mock.assert_async().await;
        match status {
            pagedrop::PushStatus::Completed(response) => {
                assert_eq!(response.content.unwrap().sha, "abc123");
                assert_eq!(response.commit.unwrap().sha, "def456");
            }
            pagedrop::PushStatus::Aborted => panic!("push was not cancelled"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_remote_rejection_carries_server_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT);
                then.status(404).json_body(json!({ "message": "Not Found" }));
            })
            .await;

        let queue = PushQueue::default();
        let handle = queue.push(
            destination(&server),
            "missing.html".into(),
            request(b"payload"),
        );

        match handle.join().await {
            Err(PushError::RemoteRejected { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("expected RemoteRejected, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_back_to_back_pushes_never_overlap() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let delay = Duration::from_millis(250);
        let mock = server
            .mock_async(move |when, then| {
                when.method(PUT);
                then.status(201).delay(delay).json_body(json!({}));
            })
            .await;

        let queue = PushQueue::default();
        let dest = destination(&server);

        let started = Instant::now();
        let first = queue.push(dest.clone(), "a.html".into(), request(b"a"));
        let second = queue.push(dest, "b.html".into(), request(b"b"));

        first.join().await?;
        second.join().await?;
        let elapsed = started.elapsed();

        assert_eq!(mock.hits_async().await, 2);
        // Serialized writes: the second only starts after the first settles.
        assert!(
            elapsed >= delay * 2,
            "pushes overlapped: both settled in {:?}",
            elapsed
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_pushes_to_one_scope_run_in_call_order() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let delay = Duration::from_millis(250);
        server
            .mock_async(move |when, then| {
                when.method(PUT).path_contains("first.html");
                then.status(201).delay(delay).json_body(json!({}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path_contains("second.html");
                then.status(201).json_body(json!({}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path_contains("third.html");
                then.status(201).json_body(json!({}));
            })
            .await;

        let queue = PushQueue::default();
        let dest = destination(&server);

        let started = Instant::now();
        let first = queue.push(dest.clone(), "first.html".into(), request(b"1"));
        let second = queue.push(dest.clone(), "second.html".into(), request(b"2"));
        let third = queue.push(dest, "third.html".into(), request(b"3"));

        let (first, second, third) = tokio::join!(
            async { first.join().await.map(|_| started.elapsed()) },
            async { second.join().await.map(|_| started.elapsed()) },
            async { third.join().await.map(|_| started.elapsed()) },
        );
        let (first, second, third) = (first?, second?, third?);

        // The fast writes queued behind the delayed head cannot settle
        // before it; each push settles after the one issued before it.
        assert!(first >= delay, "head settled early: {:?}", first);
        assert!(
            second >= first,
            "second push jumped ahead: {:?} < {:?}",
            second,
            first
        );
        assert!(
            third >= second,
            "third push jumped ahead: {:?} < {:?}",
            third,
            second
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_rejection_without_json_body_keeps_diagnostics() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path_contains("plain.html");
                then.status(500).body("upstream exploded");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path_contains("empty.html");
                then.status(502);
            })
            .await;

        let queue = PushQueue::default();
        let dest = destination(&server);

        match queue
            .push(dest.clone(), "plain.html".into(), request(b"p"))
            .join()
            .await
        {
            Err(PushError::RemoteRejected { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("expected RemoteRejected, got {:?}", other.map(|_| ())),
        }

        // An empty body still yields a readable reason.
        match queue
            .push(dest, "empty.html".into(), request(b"e"))
            .join()
            .await
        {
            Err(PushError::RemoteRejected { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("expected RemoteRejected, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_cancellation_is_aborted_not_error_and_frees_the_scope() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path_contains("slow.html");
                then.status(201)
                    .delay(Duration::from_secs(30))
                    .json_body(json!({}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path_contains("fast.html");
                then.status(201).json_body(json!({}));
            })
            .await;

        let queue = PushQueue::default();
        let dest = destination(&server);

        let handle = queue.push(dest.clone(), "slow.html".into(), request(b"s"));

        // Let the write reach its network call, then cancel it.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(queue.pending_path(&dest).as_deref(), Some("slow.html"));
        handle.cancel();

        let status = handle.join().await.unwrap();
        assert!(status.is_aborted());

        // Scope is back to idle and accepts a new push immediately.
        assert_eq!(queue.pending_path(&dest), None);
        let status = queue
            .push(dest, "fast.html".into(), request(b"f"))
            .join()
            .await
            .unwrap();
        assert!(!status.is_aborted());
    }

    #[tokio::test]
    async fn test_scope_level_cancel_without_a_handle() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT);
                then.status(201)
                    .delay(Duration::from_secs(30))
                    .json_body(json!({}));
            })
            .await;

        let queue = PushQueue::default();
        let dest = destination(&server);

        let handle = queue.push(dest.clone(), "page.html".into(), request(b"p"));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(queue.cancel_pending(&dest));
        assert!(handle.join().await.unwrap().is_aborted());
        assert!(!queue.cancel_pending(&dest));
    }
}
