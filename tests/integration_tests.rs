//! Integration tests for dir-sizer
//!
//! All tests run against in-memory trees from `dir_sizer::fixture`.

use dir_sizer::error::{NodeError, NodeOp, SizeError, WorkerError};
use dir_sizer::fixture::{Fault, ListingProbe, MemDir, TreeShape};
use async_trait::async_trait;
use dir_sizer::config::MAX_WORKERS;
use dir_sizer::error::NodeResult;
use dir_sizer::{compute, Dir, DirRef, DirSizer, Listing, SizeResult, SizerConfig, MIN_WORKERS};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

fn small_tree() -> MemDir {
    MemDir::new("/")
        .with_dir("a", |d| d.with_file("f1", 10))
        .with_dir("b", |d| d.with_file("f1", 5).with_file("f2", 7))
}

/// A directory whose listing takes a long time and never looks at the token
struct SlowDir {
    path: &'static str,
    delay: Duration,
    children: Vec<DirRef>,
}

#[async_trait]
impl Dir for SlowDir {
    fn path(&self) -> &str {
        self.path
    }

    async fn list(&self, _cancel: &CancellationToken) -> NodeResult<Listing> {
        tokio::time::sleep(self.delay).await;
        Ok(Listing::new(self.children.clone(), Vec::new()))
    }
}

fn shape(depth: u32, breadth: usize) -> TreeShape {
    TreeShape {
        depth,
        breadth,
        files_per_dir: 3,
        file_size: 100,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_small_tree_totals() {
    let cancel = CancellationToken::new();
    let result = compute(&cancel, Arc::new(small_tree()), 4).await.unwrap();

    assert_eq!(result.size, 22);
    assert_eq!(result.count, 3);
    assert_eq!(result.dirs, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_result_independent_of_bound() {
    let tree = Arc::new(shape(3, 4).build());
    let cancel = CancellationToken::new();

    let mut results = Vec::new();
    for bound in [1, 4, 16, 64] {
        results.push(compute(&cancel, tree.clone(), bound).await.unwrap());
    }

    assert!(results.iter().all(|r| *r == results[0]));
    assert_eq!(results[0], shape(3, 4).expected());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_totals_are_additive() {
    let left = shape(2, 3);
    let right = TreeShape {
        files_per_dir: 1,
        file_size: 9,
        ..shape(1, 5)
    };

    let root = MemDir::new("/")
        .with_file("top", 1000)
        .with_dir("left", |_| left.build())
        .with_dir("right", |_| right.build());

    // Subtrees built from shapes are rooted at "/", only their totals matter here
    let cancel = CancellationToken::new();
    let result = compute(&cancel, Arc::new(root), 8).await.unwrap();

    let want = SizeResult::new(
        1000 + left.expected().size + right.expected().size,
        1 + left.expected().count + right.expected().count,
        1 + left.expected().dirs + right.expected().dirs,
    );
    assert_eq!(result, want);
}

#[tokio::test]
async fn test_empty_tree() {
    let cancel = CancellationToken::new();
    let result = compute(&cancel, Arc::new(MemDir::new("/")), 4).await.unwrap();

    assert_eq!(result, SizeResult::new(0, 0, 1));
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_empty_directories_only() {
    let root = MemDir::new("/")
        .with_dir("a", |d| d.with_dir("b", |d| d.with_dir("c", |d| d)))
        .with_dir("e", |d| d);

    let cancel = CancellationToken::new();
    let result = compute(&cancel, Arc::new(root), 1).await.unwrap();
    assert_eq!(result, SizeResult::new(0, 0, 5));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_list_failure_fails_fast() {
    for bound in [1, 4, 32] {
        let probe = ListingProbe::new();
        let mut root = shape(3, 5).build().instrument(&probe);
        let denied = NodeError::PermissionDenied {
            path: "/d1/d3".into(),
        };
        assert!(root.inject_fault("/d1/d3", Fault::Fail(denied.clone())));

        let cancel = CancellationToken::new();
        let err = compute(&cancel, Arc::new(root), bound).await.unwrap_err();

        match err {
            SizeError::Traversal { op, path, source } => {
                assert_eq!(op, NodeOp::List);
                assert_eq!(path, "/d1/d3");
                assert_eq!(source, denied);
            }
            other => panic!("bound {}: unexpected error {:?}", bound, other),
        }
        assert_eq!(probe.active_listings(), 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stat_failure_fails_fast() {
    for bound in [1, 8] {
        let root = MemDir::new("/")
            .with_dir("ok", |d| d.with_file("x", 1))
            .with_dir("broken", |d| {
                d.with_file("good", 2).with_faulty_file(
                    "bad",
                    Fault::Fail(NodeError::Io {
                        path: "/broken/bad".into(),
                        reason: "input/output error".into(),
                    }),
                )
            });

        let cancel = CancellationToken::new();
        let err = compute(&cancel, Arc::new(root), bound).await.unwrap_err();

        assert!(
            matches!(&err, SizeError::Traversal { op: NodeOp::Stat, path, .. } if path == "/broken/bad"),
            "bound {}: unexpected error {:?}",
            bound,
            err
        );
        assert_eq!(err.path(), Some("/broken/bad"));
    }
}

#[tokio::test]
async fn test_cancelled_before_call() {
    let probe = ListingProbe::new();
    let root = small_tree().instrument(&probe);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = compute(&cancel, Arc::new(root), 4).await.unwrap_err();
    assert!(matches!(err, SizeError::Cancelled));
    assert_eq!(probe.lists(), 0);
    assert_eq!(probe.stats(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_mid_flight() {
    let probe = ListingProbe::new();
    let mut root = shape(2, 4).build().instrument(&probe);
    assert!(root.inject_fault("/d2/d1", Fault::Hang));

    let cancel = CancellationToken::new();
    let run = {
        let cancel = cancel.clone();
        tokio::spawn(async move { compute(&cancel, Arc::new(root), 4).await })
    };

    // Every directory gets listed, the hanging one never returns
    let total = shape(2, 4).dir_count().unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while probe.lists() < total {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("listings did not start");
    assert!(!run.is_finished());
    assert_eq!(probe.active_listings(), 1);

    cancel.cancel();
    let err = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run did not stop after cancellation")
        .unwrap()
        .unwrap_err();

    assert!(err.is_cancellation());
    assert!(matches!(err, SizeError::Cancelled));
    assert_eq!(probe.active_listings(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrency_never_exceeds_bound() {
    for bound in [1, 4, 6] {
        let probe = ListingProbe::new();
        let root = shape(2, 8)
            .build()
            .with_latency(Duration::from_millis(2))
            .instrument(&probe);

        let cancel = CancellationToken::new();
        let result = compute(&cancel, Arc::new(root), bound).await.unwrap();

        let effective = bound.max(MIN_WORKERS);
        assert_eq!(result, shape(2, 8).expected());
        assert!(
            probe.peak_listings() <= effective,
            "bound {}: peak {} exceeds {}",
            bound,
            probe.peak_listings(),
            effective
        );
        assert!(probe.peak_listings() >= 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_listings_overlap_when_allowed() {
    let probe = ListingProbe::new();
    let root = shape(1, 16)
        .build()
        .with_latency(Duration::from_millis(20))
        .instrument(&probe);

    let cancel = CancellationToken::new();
    compute(&cancel, Arc::new(root), 8).await.unwrap();

    assert!(probe.peak_listings() > 1);
    assert!(probe.peak_listings() <= 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_minimum_bound_completes() {
    // A bound below the floor still makes progress on a tree much larger than it
    let cancel = CancellationToken::new();
    let result = tokio::time::timeout(
        Duration::from_secs(10),
        compute(&cancel, Arc::new(shape(3, 5).build()), 1),
    )
    .await
    .expect("sizing with bound 1 stalled")
    .unwrap();

    assert_eq!(result, shape(3, 5).expected());
    assert_eq!(result.dirs, 156);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_panic_becomes_worker_error() {
    let probe = ListingProbe::new();
    let root = MemDir::new("/")
        .with_dir("fine", |d| d.with_file("x", 1))
        .with_dir("boom", |d| d.with_fault(Fault::Panic))
        .instrument(&probe);

    let cancel = CancellationToken::new();
    let err = compute(&cancel, Arc::new(root), 4).await.unwrap_err();

    match err {
        SizeError::Worker(WorkerError::Panicked { path, message }) => {
            assert_eq!(path, "/boom");
            assert!(message.contains("injected panic"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(probe.active_listings(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deadline_stops_run() {
    let probe = ListingProbe::new();
    let mut root = shape(2, 3).build().instrument(&probe);
    assert!(root.inject_fault("/d0", Fault::Hang));

    let sizer = DirSizer::new(SizerConfig::with_workers(4).deadline(Duration::from_millis(100))).unwrap();
    let cancel = CancellationToken::new();
    let err = sizer.size(&cancel, Arc::new(root)).await.unwrap_err();

    assert!(matches!(err, SizeError::DeadlineExceeded(_)));
    assert!(err.is_cancellation());
    assert_eq!(probe.active_listings(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sizer_is_reusable() {
    let sizer = DirSizer::with_workers(4).unwrap();
    let tree = Arc::new(small_tree());

    let mut failing = small_tree();
    failing.inject_fault("/a", Fault::Fail(NodeError::NotFound { path: "/a".into() }));

    let cancel = CancellationToken::new();
    assert!(sizer.size(&cancel, Arc::new(failing)).await.is_err());
    assert_eq!(sizer.size(&cancel, tree.clone()).await.unwrap().size, 22);
    assert_eq!(sizer.size(&cancel, tree).await.unwrap().count, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bound_above_maximum_is_clamped() {
    let probe = ListingProbe::new();
    let root = shape(1, 8)
        .build()
        .with_latency(Duration::from_millis(2))
        .instrument(&probe);

    let cancel = CancellationToken::new();
    let result = compute(&cancel, Arc::new(root), 1000).await.unwrap();

    assert_eq!(result, shape(1, 8).expected());
    assert!(probe.peak_listings() <= MAX_WORKERS);
    assert_eq!(
        compute(&cancel, Arc::new(small_tree()), usize::MAX).await.unwrap(),
        SizeResult::new(22, 3, 3)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_does_not_wait_for_slow_listing() {
    let root = SlowDir {
        path: "/",
        delay: Duration::from_secs(30),
        children: Vec::new(),
    };

    let cancel = CancellationToken::new();
    let run = {
        let cancel = cancel.clone();
        tokio::spawn(async move { compute(&cancel, Arc::new(root), 4).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    let cancelled_at = Instant::now();
    cancel.cancel();

    let err = tokio::time::timeout(Duration::from_secs(2), run)
        .await
        .expect("cancellation waited for the slow listing")
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, SizeError::Cancelled));
    assert!(cancelled_at.elapsed() < Duration::from_secs(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failure_does_not_wait_for_slow_sibling() {
    let denied = NodeError::PermissionDenied { path: "/bad".into() };
    let slow: DirRef = Arc::new(SlowDir {
        path: "/slow",
        delay: Duration::from_secs(30),
        children: Vec::new(),
    });
    let bad: DirRef = Arc::new(MemDir::new("/bad").with_fault(Fault::Fail(denied.clone())));
    let root = SlowDir {
        path: "/",
        delay: Duration::ZERO,
        children: vec![slow, bad],
    };

    let start = Instant::now();
    let cancel = CancellationToken::new();
    let err = tokio::time::timeout(Duration::from_secs(2), compute(&cancel, Arc::new(root), 4))
        .await
        .expect("first error waited for the slow sibling")
        .unwrap_err();

    assert!(matches!(&err, SizeError::Traversal { source, .. } if *source == denied));
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(!cancel.is_cancelled());
}

#[tokio::test]
async fn test_node_cancellation_without_caller_cancel_is_a_failure() {
    let root = MemDir::new("/").with_dir("a", |d| d.with_fault(Fault::Fail(NodeError::Cancelled)));

    let cancel = CancellationToken::new();
    let err = compute(&cancel, Arc::new(root), 4).await.unwrap_err();

    match err {
        SizeError::Traversal { op, path, source } => {
            assert_eq!(op, NodeOp::List);
            assert_eq!(path, "/a");
            assert_eq!(source, NodeError::Cancelled);
        }
        other => panic!("unexpected error {:?}", other),
    }
}
