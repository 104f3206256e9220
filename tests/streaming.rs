use std::sync::Arc;

use cgmath::{MetricSpace, Point3};
use voxel_world::engine_state::{
    config::WorldConfig,
    rendering::meshing::recording::RecordingMeshFactory,
    task_management::TaskManager,
    voxels::{
        block::block_type::BlockType,
        chunk::{chunk_center, ChunkData},
        streaming::ChunkStreamer,
        terrain::FlatTerrain,
        world::World,
    },
    EngineState,
};
use web_time::{Duration, Instant};

const ORIGIN_CENTER: Point3<f64> = Point3::new(16.0, 16.0, 16.0);

/// Cells whose centers lie within 70 units of a chunk center: every offset with |d|² <= 4.
const CELLS_WITHIN_70: usize = 33;

fn inline_streamer(draw_distance: f64) -> ChunkStreamer {
    ChunkStreamer::new(
        draw_distance,
        Arc::new(FlatTerrain::new(0.0)),
        TaskManager::new(0).unwrap(),
    )
}

fn settle(streamer: &mut ChunkStreamer, world: &mut World, viewer: Point3<f64>) {
    for _ in 0..16 {
        if streamer.pass(world, viewer).is_idle() {
            return;
        }
    }
    panic!("streaming did not settle around {viewer:?}");
}

fn assert_loaded_set_matches_draw_sphere(world: &World, viewer: Point3<f64>, draw_distance: f64) {
    for position in world.positions() {
        assert!(
            chunk_center(position).distance(viewer) <= draw_distance,
            "{position:?} is loaded but out of range"
        );
    }
    assert_eq!(world.verify_linkage(), Ok(()));
}

#[test]
fn streaming_fills_the_draw_sphere() {
    let mut streamer = inline_streamer(70.0);
    let mut world = World::new();
    settle(&mut streamer, &mut world, ORIGIN_CENTER);

    assert_eq!(world.len(), CELLS_WITHIN_70);
    assert_eq!(world.loading_count(), 0);
    assert_loaded_set_matches_draw_sphere(&world, ORIGIN_CENTER, 70.0);

    let origin = world.get_chunk_at(Point3::new(0, 0, 0)).unwrap();
    assert!(origin.is_surrounded());
}

#[test]
fn moving_viewer_evicts_behind_and_loads_ahead() {
    let mut streamer = inline_streamer(70.0);
    let mut world = World::new();
    settle(&mut streamer, &mut world, ORIGIN_CENTER);

    let mut viewer = ORIGIN_CENTER;
    let mut evicted = 0;
    for _ in 0..20 {
        viewer.x += 16.0;
        evicted += streamer.pass(&mut world, viewer).evicted;
        assert_eq!(world.verify_linkage(), Ok(()));
    }
    settle(&mut streamer, &mut world, viewer);

    assert!(evicted > 0);
    assert!(!world.contains(Point3::new(0, 0, 0)));
    assert!(world.contains(Point3::new(10, 0, 0)));
    assert_eq!(world.len(), CELLS_WITHIN_70);
    assert_loaded_set_matches_draw_sphere(&world, viewer, 70.0);
}

#[test]
fn returning_viewer_finds_its_edits_and_lights() {
    let mut streamer = inline_streamer(40.0);
    let mut world = World::new();
    settle(&mut streamer, &mut world, ORIGIN_CENTER);

    let stone = Point3::new(4, 4, 4);
    let torch = Point3::new(20, 20, 20);
    world.set_block(stone, BlockType::STONE).unwrap();
    world.place_light(torch, 15).unwrap();
    assert_eq!(world.torchlight_at(Point3::new(22, 20, 20)), Ok(13));

    let away = Point3::new(16.0 + 32.0 * 8.0, 16.0, 16.0);
    settle(&mut streamer, &mut world, away);
    assert!(!world.contains(Point3::new(0, 0, 0)));

    settle(&mut streamer, &mut world, ORIGIN_CENTER);
    assert_eq!(world.block_at(stone), Ok(BlockType::STONE));
    assert_eq!(world.torchlight_at(torch), Ok(15));
    assert_eq!(world.torchlight_at(Point3::new(22, 20, 20)), Ok(13));
}

#[test]
fn light_follows_links_across_chunk_faces() {
    let mut world = World::new();
    world.insert_chunk(Point3::new(0, 0, 0), ChunkData::default());
    world.insert_chunk(Point3::new(1, 0, 0), ChunkData::default());

    world.place_light(Point3::new(30, 5, 5), 15).unwrap();
    assert_eq!(world.torchlight_at(Point3::new(31, 5, 5)), Ok(14));
    assert_eq!(world.torchlight_at(Point3::new(33, 5, 5)), Ok(12));
    assert_eq!(world.torchlight_at(Point3::new(44, 5, 5)), Ok(1));
    assert_eq!(world.torchlight_at(Point3::new(45, 5, 5)), Ok(0));

    let mut local_only = World::with_settings(0, false);
    local_only.insert_chunk(Point3::new(0, 0, 0), ChunkData::default());
    local_only.insert_chunk(Point3::new(1, 0, 0), ChunkData::default());
    local_only.place_light(Point3::new(30, 5, 5), 15).unwrap();
    assert_eq!(local_only.torchlight_at(Point3::new(31, 5, 5)), Ok(14));
    assert_eq!(local_only.torchlight_at(Point3::new(32, 5, 5)), Ok(0));
}

#[test]
fn engine_streams_meshes_and_tears_them_down() {
    let config = WorldConfig::from_json_str(
        r#"{
            "draw_distance_chunks": 1.5,
            "streaming_interval_ms": 5,
            "worker_threads": 2,
            "viewer_start": [16.0, 16.0, 16.0]
        }"#,
    )
    .unwrap();
    let factory = RecordingMeshFactory::new();
    let mut engine = EngineState::new(config, Arc::new(factory.clone()));
    engine
        .start_streaming_with(Arc::new(FlatTerrain::new(8.0)))
        .unwrap();
    assert!(engine.is_streaming());

    // The center, its 6 face neighbors and its 12 edge neighbors lie within 48 units.
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let (loaded, loading) = {
            let world = engine.world.get();
            (world.len(), world.loading_count())
        };
        if loaded == 19 && loading == 0 {
            break;
        }
        assert!(Instant::now() < deadline, "streaming stalled at {loaded} chunks");
        std::thread::sleep(Duration::from_millis(5));
    }
    engine.stop_streaming();

    let report = engine.simulate();
    assert!(report.rebuilt > 0);
    assert_eq!(engine.world.get().dirty_count(), 0);
    assert_eq!(engine.world.get().verify_linkage(), Ok(()));

    let live: Vec<_> = factory
        .meshes()
        .into_iter()
        .filter(|mesh| !mesh.is_torn_down())
        .collect();
    assert_eq!(live.len(), 19);
    for mesh in &live {
        assert!(mesh.is_finished());
        assert!(mesh.check_face_order().is_ok());
    }

    assert_eq!(engine.shutdown(), 19);
    assert!(factory.meshes().iter().all(|mesh| mesh.is_torn_down()));
}
