use flow_loader::{
    Assets, Error, Loader, LoaderConfig,
    backend::TextureFilter,
    resources::{Data, DataKind, MemoryFetcher},
};
use futures::executor::LocalPool;
use serde::Deserialize;

use crate::common::test_utils::{
    LINK_ERROR, ManualFetcher, MockBackend, png, progress_recorder, slot,
};

mod common;

type Loaded = flow_loader::Result<Assets<MockBackend>>;

const VERTEX: &str = "@vertex fn vs_main() {}";
const FRAGMENT: &str = "@fragment fn fs_main() {}";

fn manual_loader(pool: &LocalPool) -> (Loader<MockBackend>, ManualFetcher) {
    let fetcher = ManualFetcher::new();
    let loader = Loader::new(MockBackend::new(), fetcher.clone(), pool.spawner());
    (loader, fetcher)
}

#[test]
fn should_load_data_and_texture_with_progress() {
    let mut pool = LocalPool::new();
    let (mut loader, fetcher) = manual_loader(&pool);
    let journal = loader.backend().journal.clone();

    loader
        .queue_data("greeting.txt", None, DataKind::Text)
        .queue_texture("grass.png", None, None);
    assert_eq!(loader.len(), 2);

    let (progress, on_progress) = progress_recorder();
    let (result, on_done) = slot::<Loaded>();
    loader.load_assets_with_progress(on_done, on_progress);
    assert!(loader.is_empty());

    pool.run_until_stalled();
    assert_eq!(fetcher.pending(), vec!["grass.png", "greeting.txt"]);

    fetcher.resolve("grass.png", png(4, 2));
    pool.run_until_stalled();
    assert_eq!(*progress.borrow(), vec![50.0]);
    assert!(result.borrow().is_none());

    fetcher.resolve("greeting.txt", "hello");
    pool.run_until_stalled();
    assert_eq!(*progress.borrow(), vec![50.0, 100.0]);

    let assets = result
        .borrow_mut()
        .take()
        .expect("batch did not finish")
        .expect("batch failed");
    assert_eq!(assets.len(), 2);
    assert_eq!(
        assets.get_data("greeting.txt"),
        Some(&Data::Text("hello".to_string()))
    );
    let texture = assets.get_texture("grass.png").expect("texture missing");
    assert_eq!((texture.width, texture.height), (4, 2));
    assert_eq!(texture.sampling.mag_filter, TextureFilter::Linear);
    assert_eq!(texture.sampling.min_filter, TextureFilter::Linear);
    assert!(assets.get_data("grass.png").is_none());

    assert_eq!(journal.created(), vec!["texture:grass.png"]);
    drop(assets);
    assert_eq!(journal.disposed(), vec!["texture:grass.png"]);
}

#[test]
fn should_report_monotonic_progress_for_out_of_order_completions() {
    let mut pool = LocalPool::new();
    let (mut loader, fetcher) = manual_loader(&pool);
    loader.queue_data("a.txt", None, DataKind::Text);
    loader.queue_data("b.txt", None, DataKind::Text);
    loader.queue_data("c.txt", None, DataKind::Text);

    let (progress, on_progress) = progress_recorder();
    let (result, on_done) = slot::<Loaded>();
    loader.load_assets_with_progress(on_done, on_progress);
    pool.run_until_stalled();

    for id in ["c.txt", "a.txt", "b.txt"] {
        assert!(result.borrow().is_none());
        fetcher.resolve(id, id);
        pool.run_until_stalled();
    }

    let progress = progress.borrow();
    let expected: [f32; 3] = [100.0 / 3.0, 200.0 / 3.0, 100.0];
    assert_eq!(progress.len(), expected.len());
    for (actual, expected) in progress.iter().zip(expected) {
        assert!((actual - expected).abs() < 1e-4, "{:?}", progress);
    }
    assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(progress.last(), Some(&100.0));

    let assets = result
        .borrow_mut()
        .take()
        .expect("batch did not finish")
        .expect("batch failed");
    assert_eq!(assets.len(), 3);
}

#[test]
fn should_finish_empty_batch_without_progress() {
    let pool = LocalPool::new();
    let (mut loader, _) = manual_loader(&pool);

    let (progress, on_progress) = progress_recorder();
    let (result, on_done) = slot::<Loaded>();
    loader.load_assets_with_progress(on_done, on_progress);

    let assets = result
        .borrow_mut()
        .take()
        .expect("empty batch should finish right away")
        .expect("empty batch failed");
    assert!(assets.is_empty());
    assert!(assets.get_data("anything").is_none());
    assert!(progress.borrow().is_empty());
}

#[test]
fn should_fail_batch_when_a_program_does_not_link() {
    let mut pool = LocalPool::new();
    let fetcher = MemoryFetcher::new()
        .with("basic.vert.wgsl", VERTEX)
        .with("basic.frag.wgsl", FRAGMENT)
        .with("broken.vert.wgsl", format!("{}\n// {}", VERTEX, LINK_ERROR))
        .with("broken.frag.wgsl", FRAGMENT)
        .with("sprite.vert.wgsl", VERTEX)
        .with("sprite.frag.wgsl", FRAGMENT);
    let mut loader = Loader::new(MockBackend::new(), fetcher, pool.spawner());
    let journal = loader.backend().journal.clone();

    loader.queue_programs([
        ("basic", vec!["position"]),
        ("broken", vec!["position"]),
        ("sprite", vec!["position", "tex_coords"]),
    ]);

    let (progress, on_progress) = progress_recorder();
    let (result, on_done) = slot::<Loaded>();
    loader.load_assets_with_progress(on_done, on_progress);
    pool.run_until_stalled();

    match result.borrow_mut().take().expect("batch did not finish") {
        Err(Error::Program { id, .. }) => assert_eq!(id, "broken"),
        other => panic!("expected a link failure, got {:?}", other),
    }
    assert_eq!(progress.borrow().last(), Some(&100.0));

    let mut created = journal.created();
    created.sort();
    assert_eq!(created, vec!["program:basic", "program:sprite"]);
    assert_eq!(journal.disposed(), created);
}

#[test]
fn should_report_failed_fetch_with_its_id() {
    let mut pool = LocalPool::new();
    let (mut loader, fetcher) = manual_loader(&pool);
    let journal = loader.backend().journal.clone();

    loader
        .queue_texture("rock.png", None, None)
        .queue_texture("missing.png", None, None);
    let (result, on_done) = slot::<Loaded>();
    loader.load_assets(on_done);
    pool.run_until_stalled();

    fetcher.reject("missing.png", "404 not found");
    pool.run_until_stalled();
    assert!(
        result.borrow().is_none(),
        "a failed batch still waits for its other loads"
    );

    fetcher.resolve("rock.png", png(1, 1));
    pool.run_until_stalled();

    match result.borrow_mut().take().expect("batch did not finish") {
        Err(Error::Fetch { id, .. }) => assert_eq!(id, "missing.png"),
        other => panic!("expected a fetch failure, got {:?}", other),
    }
    assert_eq!(journal.disposed(), vec!["texture:rock.png"]);
}

#[test]
fn should_reject_undecodable_payloads() {
    let mut pool = LocalPool::new();
    let fetcher = MemoryFetcher::new()
        .with("broken.png", b"definitely not a png".to_vec())
        .with("broken.json", "{ not json");

    let mut loader = Loader::new(MockBackend::new(), fetcher, pool.spawner());
    loader.queue_texture("broken.png", None, None);
    match pool.run_until(loader.load()) {
        Err(Error::Decode { id, .. }) => assert_eq!(id, "broken.png"),
        other => panic!("expected a decode failure, got {:?}", other),
    }

    loader.queue_json("broken.json", None);
    match pool.run_until(loader.load()) {
        Err(Error::Decode { id, .. }) => assert_eq!(id, "broken.json"),
        other => panic!("expected a decode failure, got {:?}", other),
    }
}

#[test]
fn should_decode_json_and_pass_params() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Level {
        name: String,
        enemies: u32,
    }

    let mut pool = LocalPool::new();
    let (mut loader, fetcher) = manual_loader(&pool);
    let params = vec![("lang".to_string(), "de".to_string())];
    loader.queue_json("levels/one.json", Some(params.clone()));

    let (result, on_done) = slot::<Loaded>();
    loader.load_assets(on_done);
    pool.run_until_stalled();
    assert_eq!(
        fetcher.requested(),
        vec![("levels/one.json".to_string(), Some(params))]
    );

    fetcher.resolve("levels/one.json", r#"{ "name": "one", "enemies": 3 }"#);
    pool.run_until_stalled();

    let assets = result
        .borrow_mut()
        .take()
        .expect("batch did not finish")
        .expect("batch failed");
    let level: Level = assets
        .get_json("levels/one.json")
        .expect("level missing")
        .expect("level does not match");
    assert_eq!(
        level,
        Level {
            name: "one".to_string(),
            enemies: 3
        }
    );
    assert_eq!(
        assets.get_data("levels/one.json").map(Data::kind),
        Some(DataKind::Json)
    );
}

#[test]
fn should_isolate_queued_assets_between_batches() {
    let mut pool = LocalPool::new();
    let fetcher = MemoryFetcher::new()
        .with("first.txt", "1")
        .with("second.txt", "2");
    let mut loader = Loader::new(MockBackend::new(), fetcher, pool.spawner());

    loader.queue_data("first.txt", None, DataKind::Text);
    let first = loader.take_batch();
    loader.queue_data("second.txt", None, DataKind::Binary);

    assert_eq!(first.ids().collect::<Vec<_>>(), vec!["first.txt"]);
    assert_eq!(loader.len(), 1);

    let (first_result, on_first) = slot::<Loaded>();
    first.execute(on_first);
    let second = pool
        .run_until(loader.load())
        .expect("second batch failed");
    pool.run_until_stalled();

    let first = first_result
        .borrow_mut()
        .take()
        .expect("first batch did not finish")
        .expect("first batch failed");
    assert_eq!(first.data_ids().collect::<Vec<_>>(), vec!["first.txt"]);
    assert_eq!(second.data_ids().collect::<Vec<_>>(), vec!["second.txt"]);
    assert_eq!(
        second.get_data("second.txt"),
        Some(&Data::Binary(b"2".to_vec()))
    );
}

#[test]
fn should_apply_filters_and_config() {
    let mut pool = LocalPool::new();
    let fetcher = MemoryFetcher::new()
        .with("pixel.png", png(1, 1))
        .with("smooth.png", png(1, 1))
        .with("quad.vs", VERTEX)
        .with("quad.fs", FRAGMENT);
    let config = LoaderConfig {
        vertex_suffix: ".vs".to_string(),
        fragment_suffix: ".fs".to_string(),
        mag_filter: TextureFilter::Nearest,
        ..Default::default()
    };
    let mut loader = Loader::with_config(MockBackend::new(), fetcher, pool.spawner(), config);

    loader
        .queue_texture("pixel.png", None, None)
        .queue_texture("smooth.png", Some(TextureFilter::Linear), Some(TextureFilter::Nearest))
        .queue_program("quad", ["position", "colour"]);
    let assets = pool.run_until(loader.load()).expect("batch failed");

    let pixel = assets.get_texture("pixel.png").expect("pixel.png missing");
    assert_eq!(pixel.sampling.mag_filter, TextureFilter::Nearest);
    assert_eq!(pixel.sampling.min_filter, TextureFilter::Linear);

    let smooth = assets.get_texture("smooth.png").expect("smooth.png missing");
    assert_eq!(smooth.sampling.mag_filter, TextureFilter::Linear);
    assert_eq!(smooth.sampling.min_filter, TextureFilter::Nearest);

    let quad = assets.get_program("quad").expect("quad missing");
    assert_eq!(quad.vertex, VERTEX);
    assert_eq!(quad.fragment, FRAGMENT);
    assert_eq!(quad.attributes, vec!["position", "colour"]);
}
