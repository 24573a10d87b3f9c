mod common;

use approx::assert_relative_eq;
use common::{assert_state_close, patch_file, word_offset, ByteOrder, SegmentSpec, SpkWriter};
use hifitime::Epoch;
use nalgebra::Vector3;
use naif_spk::{
    constants::{OBLIQUITY_J2000, VLIGHT},
    env_state::{Aberration, KernelEnv, LightTimeConfig},
    KernelContext, KernelError, StateVector,
};
use tempfile::TempDir;

const J2000: i32 = 1;
const ECLIPJ2000: i32 = 17;
const IAU_EARTH: i32 = 10013;

fn geometric() -> KernelContext {
    KernelContext::with_env(KernelEnv::new().with_aberration(Aberration::None))
}

/// Earth and Moon around the Earth barycenter.
fn earth_moon(order: ByteOrder) -> SpkWriter {
    SpkWriter::new(order)
        .segment(SegmentSpec::fixed(399, 3, J2000, -1e6, 1e6, [1.0, 2.0, 3.0]))
        .segment(SegmentSpec::fixed(301, 3, J2000, -1e6, 1e6, [-4.0, 0.0, 10.0]))
}

/// Planetary barycenters around the SSB, Mars around its barycenter.
fn planets(order: ByteOrder) -> SpkWriter {
    SpkWriter::new(order)
        .segment(SegmentSpec::linear(
            3,
            0,
            J2000,
            -1e6,
            1e6,
            4,
            [1e8, 0.0, 0.0],
            [0.0, 30.0, 0.0],
        ))
        .segment(SegmentSpec::fixed(4, 0, J2000, -1e6, 1e6, [2e8, 1e7, 0.0]))
        .segment(SegmentSpec::fixed(499, 4, J2000, -1e6, 1e6, [100.0, 0.0, 0.0]))
}

#[test]
fn test_chain_across_two_files() {
    let dir = TempDir::new().unwrap();
    let a = earth_moon(ByteOrder::Little).write(&dir, "earth_moon.bsp");
    let b = planets(ByteOrder::Little).write(&dir, "planets.bsp");

    let mut ctx = geometric();
    ctx.load_kernel(&a).unwrap();
    ctx.load_kernel(&b).unwrap();

    let t = 1000.0;
    let (state, lt) = ctx.get_state_relative_to_body("MOON", t, "J2000", "MARS").unwrap();
    let expected = StateVector::new(
        Vector3::new(-4.0 + 1e8 - 2e8 - 100.0, 30.0 * t - 1e7, 10.0),
        Vector3::new(0.0, 30.0, 0.0),
        t,
        J2000,
    );
    assert_state_close(&state, &expected, 1e-6);
    assert_relative_eq!(lt, state.range() / VLIGHT, max_relative = 1e-14);
    assert_eq!(state.light_time, Some(lt));

    // siblings of the Earth barycenter meet before the SSB
    let (moon_from_earth, _) = ctx.get_state_relative_to_body("301", t, "J2000", "399").unwrap();
    assert_relative_eq!(moon_from_earth.position, Vector3::new(-5.0, -2.0, 7.0), epsilon = 1e-9);
    assert_relative_eq!(moon_from_earth.velocity, Vector3::zeros(), epsilon = 1e-12);

    // the observer being an ancestor of the target
    let (earth_from_ssb, _) = ctx
        .get_state_relative_to_body("EARTH", t, "J2000", "SOLAR SYSTEM BARYCENTER")
        .unwrap();
    assert_relative_eq!(earth_from_ssb.position, Vector3::new(1e8 + 1.0, 30.0 * t + 2.0, 3.0), epsilon = 1e-6);

    // and the reverse
    let (ssb_from_earth, _) = ctx.get_state_relative_to_body("SSB", t, "J2000", "EARTH").unwrap();
    assert_relative_eq!(ssb_from_earth.position, -earth_from_ssb.position, epsilon = 1e-6);
    assert_relative_eq!(ssb_from_earth.velocity, -earth_from_ssb.velocity, epsilon = 1e-12);
    assert_eq!(ssb_from_earth.epoch, t);
}

#[test]
fn test_byte_orders_give_the_same_states() {
    let dir = TempDir::new().unwrap();
    let mut contexts: Vec<KernelContext> = Vec::new();
    let variants = [
        (earth_moon(ByteOrder::Little), planets(ByteOrder::Little), "le"),
        (earth_moon(ByteOrder::Big), planets(ByteOrder::Big), "be"),
        (
            earth_moon(ByteOrder::Big).without_locfmt(),
            planets(ByteOrder::Big).without_locfmt(),
            "be_no_locfmt",
        ),
        (
            earth_moon(ByteOrder::Little).without_locfmt(),
            planets(ByteOrder::Big),
            "mixed",
        ),
    ];
    for (a, b, tag) in variants {
        let mut ctx = KernelContext::new();
        ctx.load_kernel(a.write(&dir, &format!("a_{tag}.bsp"))).unwrap();
        ctx.load_kernel(b.write(&dir, &format!("b_{tag}.bsp"))).unwrap();
        contexts.push(ctx);
    }

    for epoch in [-9.9e5, -1234.5, 0.0, 4.2e5, 9.9e5] {
        let states: Vec<(StateVector, f64)> = contexts
            .iter_mut()
            .map(|ctx| ctx.get_state_relative_to_body("MARS", epoch, "ECLIPJ2000", "MOON").unwrap())
            .collect();
        let (reference, reference_lt) = &states[0];
        for (state, lt) in &states[1..] {
            assert_state_close(state, reference, 1e-10);
            assert_relative_eq!(*lt, *reference_lt, epsilon = 1e-10);
        }
    }
}

#[test]
fn test_latest_loaded_kernel_wins() {
    let dir = TempDir::new().unwrap();
    let old = SpkWriter::new(ByteOrder::Little)
        .segment(SegmentSpec::fixed(399, 3, J2000, -1e6, 1e6, [1.0, 0.0, 0.0]))
        .write(&dir, "old.bsp");
    let new = SpkWriter::new(ByteOrder::Big)
        .segment(SegmentSpec::fixed(399, 3, J2000, -10.0, 10.0, [5.0, 0.0, 0.0]))
        .write(&dir, "new.bsp");

    let mut ctx = geometric();
    ctx.load_kernel(&old).unwrap();
    ctx.load_kernel(&new).unwrap();

    let x_at = |ctx: &mut KernelContext, t: f64| {
        ctx.get_state_relative_to_body("EARTH", t, "J2000", "EARTH BARYCENTER")
            .unwrap()
            .0
            .position
            .x
    };
    assert_relative_eq!(x_at(&mut ctx, 0.0), 5.0);
    // outside the newer window the older kernel is still used
    assert_relative_eq!(x_at(&mut ctx, 100.0), 1.0);

    // reloading does not move a kernel to the front
    ctx.load_kernel(&old).unwrap();
    assert_relative_eq!(x_at(&mut ctx, 0.0), 5.0);

    assert!(ctx.unload_kernel(&new));
    assert_relative_eq!(x_at(&mut ctx, 0.0), 1.0);
}

#[test]
fn test_last_segment_of_a_file_wins() {
    let dir = TempDir::new().unwrap();
    let path = SpkWriter::new(ByteOrder::Little)
        .segment(SegmentSpec::fixed(399, 3, J2000, -1e6, 1e6, [1.0, 0.0, 0.0]).named("FIRST"))
        .segment(SegmentSpec::fixed(399, 3, J2000, -10.0, 10.0, [2.0, 0.0, 0.0]).named("SECOND"))
        .write(&dir, "overlap.bsp");

    let mut ctx = geometric();
    ctx.load_kernel(&path).unwrap();
    let (state, _) = ctx.get_state_relative_to_body("EARTH", 0.0, "J2000", "3").unwrap();
    assert_relative_eq!(state.position.x, 2.0);
    let (state, _) = ctx.get_state_relative_to_body("EARTH", 50.0, "J2000", "3").unwrap();
    assert_relative_eq!(state.position.x, 1.0);
}

#[test]
fn test_several_summary_records() {
    let dir = TempDir::new().unwrap();
    let mut writer = SpkWriter::new(ByteOrder::Big).summaries_per_record(2);
    for k in 0..7 {
        let target = 1000 + k;
        writer = writer.segment(SegmentSpec::fixed(target, 10, J2000, -1e3, 1e3, [k as f64, 0.0, 0.0]));
    }
    let path = writer.write(&dir, "chained_records.bsp");

    let mut ctx = geometric();
    assert_eq!(
        ctx.spk_objects(&path).unwrap().into_iter().collect::<Vec<_>>(),
        (1000..1007).collect::<Vec<_>>()
    );
    ctx.load_kernel(&path).unwrap();
    let (state, _) = ctx.get_state_relative_to_body("1006", 0.0, "J2000", "SUN").unwrap();
    assert_relative_eq!(state.position.x, 6.0);
    let (state, _) = ctx.get_state_relative_to_body("1003", 0.0, "J2000", "1001").unwrap();
    assert_relative_eq!(state.position.x, 2.0);
}

#[test]
fn test_disjoint_trees_are_a_chain_error() {
    let dir = TempDir::new().unwrap();
    let path = SpkWriter::new(ByteOrder::Little)
        .segment(SegmentSpec::fixed(399, 3, J2000, -1e6, 1e6, [1.0, 0.0, 0.0]))
        .segment(SegmentSpec::fixed(499, 4, J2000, -1e6, 1e6, [1.0, 0.0, 0.0]))
        .write(&dir, "disjoint.bsp");

    let mut ctx = KernelContext::new();
    ctx.load_kernel(&path).unwrap();
    assert_eq!(
        ctx.get_state_relative_to_body("EARTH", 12.0, "J2000", "MARS"),
        Err(KernelError::Chain {
            target: 399,
            observer: 499,
            epoch: 12.0
        })
    );
    // a known body outside its windows is a coverage gap
    assert_eq!(
        ctx.get_state_relative_to_body("EARTH", 2e6, "J2000", "3"),
        Err(KernelError::Coverage {
            body: 399,
            center: 3,
            epoch: 2e6
        })
    );
    assert_eq!(
        ctx.get_state_relative_to_body("4", 2e6, "J2000", "MARS"),
        Err(KernelError::Coverage {
            body: 499,
            center: 4,
            epoch: 2e6
        })
    );
}

#[test]
fn test_cyclic_centers_are_a_chain_error() {
    let dir = TempDir::new().unwrap();
    let path = SpkWriter::new(ByteOrder::Little)
        .segment(SegmentSpec::fixed(1000, 1001, J2000, -1e6, 1e6, [1.0, 0.0, 0.0]))
        .segment(SegmentSpec::fixed(1001, 1000, J2000, -1e6, 1e6, [1.0, 0.0, 0.0]))
        .write(&dir, "cycle.bsp");

    let mut ctx = KernelContext::new();
    ctx.load_kernel(&path).unwrap();
    assert!(matches!(
        ctx.get_state_relative_to_body("1000", 0.0, "J2000", "SUN"),
        Err(KernelError::Chain { target: 1000, observer: 10, .. })
    ));
    assert_eq!(ctx.open_handle_count(), 1);
}

#[test]
fn test_body_fixed_frames_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = SpkWriter::new(ByteOrder::Little)
        .segment(SegmentSpec::fixed(399, 3, IAU_EARTH, -1e6, 1e6, [1.0, 0.0, 0.0]))
        .segment(SegmentSpec::fixed(3, 0, J2000, -1e6, 1e6, [1e8, 0.0, 0.0]))
        .write(&dir, "body_fixed.bsp");

    let mut ctx = geometric();
    ctx.load_kernel(&path).unwrap();

    // the segment frame is the requested one
    let (state, _) = ctx.get_state_relative_to_body("EARTH", 0.0, "IAU_EARTH", "3").unwrap();
    assert_eq!(state.frame_id, IAU_EARTH);
    assert_relative_eq!(state.position.x, 1.0);

    assert!(matches!(
        ctx.get_state_relative_to_body("EARTH", 0.0, "J2000", "3"),
        Err(KernelError::Frame(msg)) if msg.contains("IAU_EARTH")
    ));
    assert!(matches!(
        ctx.get_state_relative_to_body("EARTH", 0.0, "J2000", "SSB"),
        Err(KernelError::Frame(_))
    ));
    assert!(matches!(
        ctx.get_state_relative_to_body("3", 0.0, "IAU_EARTH", "SSB"),
        Err(KernelError::Frame(_))
    ));
}

#[test]
fn test_ecliptic_and_equatorial_links_combine() {
    let dir = TempDir::new().unwrap();
    let path = SpkWriter::new(ByteOrder::Little)
        .segment(SegmentSpec::fixed(301, 3, ECLIPJ2000, -1e6, 1e6, [0.0, 0.0, 1000.0]))
        .segment(SegmentSpec::fixed(3, 0, J2000, -1e6, 1e6, [0.0, 0.0, 0.0]))
        .write(&dir, "mixed_frames.bsp");

    let mut ctx = geometric();
    ctx.load_kernel(&path).unwrap();

    let (state, _) = ctx.get_state_relative_to_body("MOON", 0.0, "J2000", "SSB").unwrap();
    assert_eq!(state.frame_id, J2000);
    let (s, c) = OBLIQUITY_J2000.sin_cos();
    assert_relative_eq!(state.position, Vector3::new(0.0, -1000.0 * s, 1000.0 * c), epsilon = 1e-9);

    let (state, _) = ctx.get_state_relative_to_body("MOON", 0.0, "ECLIPJ2000", "SSB").unwrap();
    assert_eq!(state.frame_id, ECLIPJ2000);
    assert_relative_eq!(state.position, Vector3::new(0.0, 0.0, 1000.0), epsilon = 1e-9);

    let (state, _) = ctx.get_state_relative_to_body("SSB", 0.0, "17", "MOON").unwrap();
    assert_relative_eq!(state.position, Vector3::new(0.0, 0.0, -1000.0), epsilon = 1e-9);
}

#[test]
fn test_light_time_correction() {
    let dir = TempDir::new().unwrap();
    let (x0, v) = (1e9, 20.0);
    let path = SpkWriter::new(ByteOrder::Little)
        .segment(SegmentSpec::linear(
            1000005,
            10,
            J2000,
            -1e6,
            1e6,
            8,
            [x0, 0.0, 0.0],
            [v, 0.0, 0.0],
        ))
        .write(&dir, "receding.bsp");

    let t = 5000.0;

    let mut corrected = KernelContext::new();
    corrected.load_kernel(&path).unwrap();
    let (state, lt) = corrected.get_state_relative_to_body("1000005", t, "J2000", "SUN").unwrap();
    let expected_lt = (x0 + v * t) / (VLIGHT + v);
    assert_relative_eq!(lt, expected_lt, epsilon = 1e-9);
    assert_relative_eq!(state.position.x, x0 + v * (t - expected_lt), max_relative = 1e-12);
    assert_relative_eq!(state.velocity.x, v, max_relative = 1e-12);
    assert_eq!(state.epoch, t);
    assert_eq!(state.light_time, Some(lt));

    let mut geometric = geometric();
    geometric.load_kernel(&path).unwrap();
    let (state, lt) = geometric.get_state_relative_to_body("1000005", t, "J2000", "SUN").unwrap();
    assert_relative_eq!(state.position.x, x0 + v * t, max_relative = 1e-12);
    assert_relative_eq!(lt, (x0 + v * t) / VLIGHT, max_relative = 1e-12);

    // a single iteration already lands close to the fixed point
    let mut one_step = KernelContext::with_env(KernelEnv::new().with_light_time(LightTimeConfig::new(0.0, 1)));
    one_step.load_kernel(&path).unwrap();
    let (_, lt) = one_step.get_state_relative_to_body("1000005", t, "J2000", "SUN").unwrap();
    assert_relative_eq!(lt, expected_lt, epsilon = 1e-3);
    assert!((lt - expected_lt).abs() > 1e-9);
}

#[test]
fn test_light_time_with_a_moving_common_ancestor() {
    let dir = TempDir::new().unwrap();
    let (distance, v) = (384400.0, 30.0);
    let path = SpkWriter::new(ByteOrder::Little)
        .segment(SegmentSpec::linear(3, 0, J2000, -1e6, 1e6, 4, [1e8, 0.0, 0.0], [0.0, v, 0.0]))
        .segment(SegmentSpec::fixed(399, 3, J2000, -1e6, 1e6, [0.0; 3]))
        .segment(SegmentSpec::fixed(301, 3, J2000, -1e6, 1e6, [distance, 0.0, 0.0]))
        .write(&dir, "moving_barycenter.bsp");

    let mut ctx = KernelContext::new();
    ctx.load_kernel(&path).unwrap();
    let (state, lt) = ctx.get_state_relative_to_body("MOON", 100.0, "J2000", "EARTH").unwrap();

    // the barycenter moved by v * lt while the light travelled
    assert_relative_eq!(lt, distance / VLIGHT, max_relative = 1e-7);
    assert_relative_eq!(state.position.x, distance, max_relative = 1e-12);
    assert_relative_eq!(state.position.y, -v * lt, epsilon = 1e-6);
    assert_relative_eq!(state.velocity, Vector3::zeros(), epsilon = 1e-9);

    let mut still = geometric();
    still.load_kernel(&path).unwrap();
    let (state, _) = still.get_state_relative_to_body("MOON", 100.0, "J2000", "EARTH").unwrap();
    assert_relative_eq!(state.position, Vector3::new(distance, 0.0, 0.0), epsilon = 1e-9);
}

#[test]
fn test_fixed_heliocentric_distance() {
    let dir = TempDir::new().unwrap();
    let distance = 6.574612289039739e8;
    let path = SpkWriter::new(ByteOrder::Big)
        .segment(SegmentSpec::fixed(1000005, 10, J2000, -1e9, 1e9, [distance, 0.0, 0.0]))
        .write(&dir, "fixed.bsp");

    let mut ctx = KernelContext::new();
    ctx.load_kernel(&path).unwrap();
    let epoch = Epoch::from_gregorian_utc_at_midnight(2024, 3, 1);
    let (state, lt) = ctx.get_state_relative_to_body_at("1000005", epoch, "J2000", "SUN").unwrap();
    assert_relative_eq!(state.position.norm(), distance, max_relative = 1e-15);
    assert_relative_eq!(lt, distance / VLIGHT, max_relative = 1e-14);
    assert_relative_eq!(state.epoch, epoch.to_et_seconds());
}

#[test]
fn test_type3_segment_from_file() {
    let dir = TempDir::new().unwrap();
    let mut words = vec![0.5, 3.0];
    for _ in 0..6 {
        words.extend([1.0, 3.0, 0.5, 1.0, 0.5, -1.0, 1.0]);
    }
    let segment = SegmentSpec {
        name: "TYPE 3".into(),
        target: 2000001,
        center: 10,
        frame: J2000,
        data_type: 3,
        init: -2.5,
        intlen: 6.0,
        records: vec![words],
        window: None,
    };
    let path = SpkWriter::new(ByteOrder::Little).segment(segment).write(&dir, "type3.bsp");

    let mut ctx = geometric();
    ctx.load_kernel(&path).unwrap();
    let (state, _) = ctx.get_state_relative_to_body("2000001", 1.0, "J2000", "SUN").unwrap();
    for axis in 0..3 {
        assert_relative_eq!(state.position[axis], -0.340878, epsilon = 1e-6);
        assert_relative_eq!(state.velocity[axis], -0.340878, epsilon = 1e-6);
    }
    assert_eq!(state.frame_id, J2000);

    let linear = SpkWriter::new(ByteOrder::Big)
        .segment(SegmentSpec::linear_type3(
            2000002,
            10,
            J2000,
            0.0,
            400.0,
            4,
            [10.0, 20.0, 30.0],
            [1.0, -2.0, 0.5],
        ))
        .write(&dir, "linear3.bsp");
    ctx.load_kernel(&linear).unwrap();
    let (state, _) = ctx.get_state_relative_to_body("2000002", 150.0, "J2000", "SUN").unwrap();
    assert_relative_eq!(state.position, Vector3::new(160.0, -280.0, 105.0), epsilon = 1e-9);
    assert_relative_eq!(state.velocity, Vector3::new(1.0, -2.0, 0.5), epsilon = 1e-12);
}

#[test]
fn test_window_beyond_the_data_is_a_coverage_error() {
    let dir = TempDir::new().unwrap();
    let path = SpkWriter::new(ByteOrder::Little)
        .segment(SegmentSpec::fixed(1000, 10, J2000, 0.0, 100.0, [1.0, 0.0, 0.0]).with_window(0.0, 200.0))
        .write(&dir, "short.bsp");

    let mut ctx = geometric();
    ctx.load_kernel(&path).unwrap();
    assert!(ctx.get_state_relative_to_body("1000", 50.0, "J2000", "SUN").is_ok());
    assert_eq!(
        ctx.get_state_relative_to_body("1000", 150.0, "J2000", "SUN"),
        Err(KernelError::Coverage {
            body: 1000,
            center: 10,
            epoch: 150.0
        })
    );
}

#[test]
fn test_unsupported_data_type_fails_on_query() {
    let dir = TempDir::new().unwrap();
    let path = SpkWriter::new(ByteOrder::Little)
        .segment(SegmentSpec::fixed(1000, 10, J2000, -10.0, 10.0, [1.0, 0.0, 0.0]).with_data_type(13))
        .write(&dir, "hermite.bsp");

    let mut ctx = KernelContext::new();
    ctx.load_kernel(&path).unwrap();
    assert!(matches!(
        ctx.get_state_relative_to_body("1000", 0.0, "J2000", "SUN"),
        Err(KernelError::Format(msg)) if msg.contains("unsupported SPK data type 13")
    ));
    assert_eq!(ctx.spk_objects(&path).unwrap().len(), 1);
}

#[test]
fn test_spk_coverage_merges_windows() {
    let dir = TempDir::new().unwrap();
    let path = SpkWriter::new(ByteOrder::Little)
        .segment(SegmentSpec::fixed(399, 3, J2000, 300.0, 400.0, [0.0; 3]))
        .segment(SegmentSpec::fixed(399, 3, J2000, 0.0, 100.0, [0.0; 3]))
        .segment(SegmentSpec::fixed(301, 3, J2000, 0.0, 10.0, [0.0; 3]))
        .segment(SegmentSpec::fixed(399, 3, J2000, 50.0, 200.0, [0.0; 3]))
        .segment(SegmentSpec::fixed(399, 3, J2000, 200.0, 250.0, [0.0; 3]))
        .write(&dir, "coverage.bsp");

    let mut ctx = KernelContext::new();
    assert_eq!(
        ctx.spk_coverage(&path, "EARTH").unwrap(),
        vec![(0.0, 250.0), (300.0, 400.0)]
    );
    assert_eq!(ctx.spk_coverage(&path, "301").unwrap(), vec![(0.0, 10.0)]);
    assert!(ctx.spk_coverage(&path, "MARS").unwrap().is_empty());
    assert!(matches!(
        ctx.spk_coverage(&path, "VULCAN"),
        Err(KernelError::NameResolution(_))
    ));
    assert_eq!(ctx.open_handle_count(), 0);
}

#[test]
fn test_observer_equal_to_target() {
    let dir = TempDir::new().unwrap();
    let path = earth_moon(ByteOrder::Little).write(&dir, "earth_moon.bsp");
    let mut ctx = KernelContext::new();
    ctx.load_kernel(&path).unwrap();

    let (state, lt) = ctx.get_state_relative_to_body("MOON", 3.0, "ECLIPJ2000", "301").unwrap();
    assert_eq!(state, StateVector::zero(3.0, ECLIPJ2000).with_light_time(0.0));
    assert_eq!(lt, 0.0);
}

#[test]
fn test_absurd_footer_counts_are_format_errors() {
    let dir = TempDir::new().unwrap();
    let writer = SpkWriter::new(ByteOrder::Little)
        .segment(SegmentSpec::linear(1000, 10, J2000, -10.0, 10.0, 2, [1.0, 0.0, 0.0], [0.0; 3]));
    let (_, final_addr) = writer.segment_addresses()[0];

    // N is the last word of the segment, RSIZE the one before it
    for (address, word) in [(final_addr, 1e19_f64), (final_addr - 1, 1e19), (final_addr, 3.0)] {
        let path = writer.write(&dir, "footer.bsp");
        patch_file(&path, word_offset(address), &word.to_le_bytes());

        let mut ctx = geometric();
        ctx.load_kernel(&path).unwrap();
        assert!(
            matches!(
                ctx.get_state_relative_to_body("1000", 0.0, "J2000", "SUN"),
                Err(KernelError::Format(_))
            ),
            "footer word {word} at address {address}"
        );
        ctx.unload_all();
    }
}

#[test]
#[ignore = "needs tests/data/mar097_20160314_20300101.bsp"]
fn test_mars_kernel() {
    let path = "tests/data/mar097_20160314_20300101.bsp";
    let mut ctx = KernelContext::new();
    let objects: Vec<i32> = ctx.spk_objects(path).unwrap().into_iter().collect();
    assert_eq!(objects, vec![3, 4, 10, 399, 401, 402, 499]);

    ctx.load_kernel(path).unwrap();
    let epoch = Epoch::from_gregorian_utc_at_midnight(2020, 10, 6);
    let (state, lt) = ctx.get_state_relative_to_body_at("MARS", epoch, "J2000", "EARTH").unwrap();
    // close approach of October 2020, about 0.415 AU
    assert!(state.range() > 6.0e7 && state.range() < 6.5e7);
    assert!(lt > 200.0 && lt < 217.0);
}
