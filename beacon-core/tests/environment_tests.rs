use beacon_core::environment::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_out_of_bounds_is_free() {
    let mut map = GridMap::empty(10, 10);
    map.fill_rect(0, 0, 10, 10, Cell::Wall);
    assert_eq!(map.get(-1, 5), Cell::Free);
    assert_eq!(map.get(5, 10), Cell::Free);
    assert_eq!(map.get(5, 5), Cell::Wall);
}

#[test]
fn test_arena_has_border_and_open_floor() {
    let map = GridMap::arena(800, 600);
    assert_eq!(map.get(0, 300), Cell::Wall);
    assert_eq!(map.get(799, 300), Cell::Wall);
    assert_eq!(map.get(400, 599), Cell::Wall);
    assert_eq!(map.get(400, 500), Cell::Free);
    assert_eq!(map.get(400, 100), Cell::Wall);
}

#[test]
fn test_from_ascii() {
    let map = GridMap::from_ascii("#####\n#..B#\n#.\n#####\n").unwrap();
    assert_eq!(map.width(), 5);
    assert_eq!(map.height(), 4);
    assert_eq!(map.get(0, 0), Cell::Wall);
    assert_eq!(map.get(3, 1), Cell::Beacon);
    assert_eq!(map.get(1, 2), Cell::Free);
    assert_eq!(map.get(4, 2), Cell::Free);
}

#[test]
fn test_from_ascii_empty_rejected() {
    assert!(GridMap::from_ascii("\n \n").is_err());
}

#[test]
fn test_is_clear_ignores_free_and_beacon() {
    let mut map = GridMap::empty(50, 50);
    map.set(20, 20, Cell::Beacon);
    assert!(map.is_clear(10, 10, 20, 20));
    map.set(25, 25, Cell::Wall);
    assert!(!map.is_clear(10, 10, 20, 20));
}

#[test]
fn test_closure_classifier() {
    let c = |x: i64, _y: i64| if x > 3 { Cell::Wall } else { Cell::Free };
    assert_eq!(c.classify(4, 0), Cell::Wall);
    assert_eq!(c.classify(3, 0), Cell::Free);
}

#[test]
fn test_beacon_contains() {
    let b = Beacon::new(100.0, 100.0);
    assert!(b.contains(100, 100));
    assert!(b.contains(129, 129));
    assert!(!b.contains(130, 100));
    assert!(!b.contains(99, 100));
}

#[test]
fn test_beacon_reach_margin() {
    let b = Beacon::new(100.0, 100.0);
    assert!(b.is_reached(115.0, 115.0));
    assert!(b.is_reached(85.0, 110.0));
    assert!(b.is_reached(145.0, 145.0));
    assert!(!b.is_reached(84.9, 110.0));
    assert!(!b.is_reached(110.0, 145.1));
}

#[test]
fn test_relocate_respects_padding_and_walls() {
    let mut map = GridMap::empty(400, 300);
    map.fill_rect(0, 0, 200, 300, Cell::Wall);
    let mut rng = StdRng::seed_from_u64(17);
    let mut b = Beacon::new(0.0, 0.0);

    for _ in 0..50 {
        b.relocate(&map, &mut rng);
        assert!(b.x >= 200.0 && b.x <= (400 - 30 - 50) as f64);
        assert!(b.y >= 50.0 && b.y <= (300 - 30 - 50) as f64);
        assert!(map.is_clear(b.x as usize, b.y as usize, 30, 30));
    }
}
