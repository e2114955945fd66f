use super::*;

const CSV: &str = "\
U101,Living Room,\"X_1000 Y_2000 Z_0\",\"X_5000 Y_2000 Z_0\",\"X_5000 Y_6000 Z_0\",\"X_1000 Y_6000 Z_0\"
U101,Bed-1 (north),X_0 Y_0 Z_0,X_2000 Y_0 Z_0,X_2000 Y_1000 Z_0,,
U201,Living Room,X_1000 Y_2000 Z_3100,X_11000 Y_2000 Z_3100,X_11000 Y_8000 Z_3100
header,only
U202,Study,not a coordinate,X_-500 Y_250 Z_3100
";

#[test]
fn parses_and_converts_to_metres() {
    let points = parse_room_boundaries(CSV).unwrap();
    assert_eq!(points.len(), 4 + 3 + 3 + 1);
    let study = points.iter().find(|p| p.room == "Study").unwrap();
    assert_eq!(study.x, -0.5);
    assert_eq!(study.y, 0.25);
    assert_eq!(study.z, 3.1);
    // Sorted by level first.
    assert!(points.windows(2).all(|w| w[0].z <= w[1].z));
}

#[test]
fn empty_csv_is_a_parse_error() {
    assert!(matches!(
        parse_room_boundaries("a,b,c\n"),
        Err(ArchilumeError::Parse(_))
    ));
}

#[test]
fn leading_byte_order_mark_is_ignored() {
    let points = parse_room_boundaries("\u{feff}A101,Bed 1,\"X_1000 Y_2000 Z_3000\"").unwrap();
    assert_eq!(points[0].apartment, "A101");
    assert_eq!((points[0].x, points[0].y, points[0].z), (1.0, 2.0, 3.0));
    let rooms = group_rooms(&points);
    assert_eq!(rooms[0].aoi_file_name(), "A101_Bed_1.aoi");
}

#[test]
fn rooms_group_by_apartment_and_room() {
    let rooms = group_rooms(&parse_room_boundaries(CSV).unwrap());
    assert_eq!(rooms.len(), 4);
    let living = rooms
        .iter()
        .find(|r| r.apartment == "U101" && r.room == "Living Room")
        .unwrap();
    assert_eq!(living.perimeter.len(), 4);
    assert_eq!(living.centroid(), (3.0, 4.0));
    assert_eq!(living.aoi_file_name(), "U101_Living_Room.aoi");

    let text = living.aoi_contents();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "AOI Points File: U101 Living Room");
    assert_eq!(lines[1], "FFL z height(m): 0");
    assert_eq!(lines[2], "CENTRAL x,y: 3.0000 4.0000");
    assert_eq!(lines[3], "NO. PERIMETER POINTS 4: x,y positions");
    assert_eq!(lines[4], "1.0000 2.0000");
    assert_eq!(lines.len(), 8);
}

#[test]
fn room_names_are_cleaned() {
    assert_eq!(clean_room_name("Bed-1 (north)"), "Bed_1_north");
    assert_eq!(clean_room_name("  Kitchen / Dining  "), "Kitchen_Dining");
}

#[test]
fn one_plan_view_per_level() {
    let points = parse_room_boundaries(CSV).unwrap();
    let views = plan_views(&points, DEFAULT_FFL_OFFSET);
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].file_name(), "plan_L00.vp");
    assert_eq!(views[1].file_name(), "plan_L01.vp");

    // Bounding box x: -0.5..11, y: 0..8
    assert_eq!(views[0].width, 11.5);
    assert_eq!(views[0].depth, 8.0);
    assert_eq!(views[0].position, [5.25, 4.0, 1.0]);
    assert_eq!(views[1].position[2], 4.1);
    assert_eq!(
        views[1].contents(),
        "rvu -vtl -vp 5.25 4 4.1 -vd 0 0 -1 -vu 0 1 0 -vh 11.5 -vv 8 -vo 0 -va 0 -vs 0 -vl 0"
    );
}

#[test]
fn generate_writes_files() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("rooms.csv");
    std::fs::write(&csv, CSV).unwrap();
    let aoi = dir.path().join("outputs/aoi");
    let view = dir.path().join("outputs/view");

    let out = generate_views(&csv, &aoi, &view, 1.5).unwrap();
    assert_eq!(out.aoi_files.len(), 4);
    assert_eq!(
        out.view_files,
        vec![view.join("plan_L00.vp"), view.join("plan_L01.vp")]
    );
    let vp = std::fs::read_to_string(&out.view_files[0]).unwrap();
    assert!(vp.contains("-vp 5.25 4 1.5 "));
    assert!(aoi.join("U202_Study.aoi").is_file());
}

#[test]
fn generate_requires_csv() {
    let dir = tempfile::tempdir().unwrap();
    let err = generate_views(
        &dir.path().join("missing.csv"),
        dir.path(),
        dir.path(),
        1.0,
    )
    .unwrap_err();
    assert!(matches!(err, ArchilumeError::NotFound { .. }));
}
