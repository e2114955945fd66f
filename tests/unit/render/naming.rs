use super::*;

#[test]
fn delimiter_once_splits_into_two_parts() {
    let name = SceneName::parse("tower_with_site_TenK_cie_overcast");
    assert_eq!(
        name,
        SceneName::Split {
            building: "tower".to_string(),
            sky: "TenK_cie_overcast".to_string(),
        }
    );
    assert_eq!(
        name.ambient_file_name("plan_L00"),
        "tower_with_site_plan_L00__TenK_cie_overcast.amb"
    );
    assert_eq!(
        name.image_file_name("plan_L00"),
        "tower_plan_L00__TenK_cie_overcast.hdr"
    );
}

#[test]
fn no_delimiter_falls_back_to_whole_name() {
    let name = SceneName::parse("model");
    assert!(!name.is_split());
    assert_eq!(name.ambient_file_name("v1"), "model_v1.amb");
    assert_eq!(name.image_file_name("v1"), "model_v1.hdr");
}

#[test]
fn empty_side_falls_back() {
    for scene in ["_with_site_sky", "building_with_site_", "_with_site_"] {
        assert_eq!(
            SceneName::parse(scene),
            SceneName::Plain(scene.to_string()),
            "{scene}"
        );
    }
}

#[test]
fn split_uses_last_delimiter() {
    let name = SceneName::parse("a_with_site_b_with_site_sky");
    assert_eq!(
        name,
        SceneName::Split {
            building: "a_with_site_b".to_string(),
            sky: "sky".to_string(),
        }
    );
}

#[test]
fn outputs_live_in_image_dir() {
    let out = SceneName::parse("b_with_site_s").outputs(Path::new("/p/outputs/image"), "v");
    assert_eq!(out.ambient, Path::new("/p/outputs/image/b_with_site_v__s.amb"));
    assert_eq!(out.image, Path::new("/p/outputs/image/b_v__s.hdr"));
    assert_eq!(out.filtered, Path::new("/p/outputs/image/b_v__s_filtered.hdr"));
}

#[test]
fn stem_helpers() {
    assert_eq!(stem_of(Path::new("/x/plan_L01.vp")), "plan_L01");
    assert_eq!(
        filtered_path(Path::new("img/a.hdr")),
        Path::new("img/a_filtered.hdr")
    );
}

#[test]
fn sunlight_outputs_sit_beside_the_direct_image() {
    let name = sun_image_file_name("tower_with_site", "plan_L00", "SS_0621_1200");
    assert_eq!(name, "tower_with_site_plan_L00_SS_0621_1200.hdr");
    let image = Path::new("img").join(name);
    assert_eq!(
        combined_path(&image),
        Path::new("img/tower_with_site_plan_L00_SS_0621_1200_combined.hdr")
    );
    assert_eq!(
        sum_path(&image),
        Path::new("img/tower_with_site_plan_L00_SS_0621_1200_sum.hdr")
    );
}
