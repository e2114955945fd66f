use super::*;
use crate::process::StdoutTarget;

fn call(preset: &str) -> RpictCall {
    RpictCall {
        program: PathBuf::from("/opt/accelerad/bin/accelerad_rpict"),
        preset: QualityPreset::lookup(preset).unwrap(),
        view: PathBuf::from("view/plan_L00.vp"),
        resolution: 1024,
        threads: 1,
        ambient: PathBuf::from("image/s_plan_L00.amb"),
        octree: PathBuf::from("octree/s.oct"),
        envs: vec![("RAYPATH".to_string(), "/lib".to_string())],
    }
}

fn args_of(spec: &CommandSpec) -> Vec<String> {
    spec.args
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn main_pass_flag_order() {
    let spec = call("fast").main_spec(Path::new("image/s_plan_L00.hdr"));
    assert_eq!(
        args_of(&spec),
        [
            "-w", "-t", "1", "-vf", "view/plan_L00.vp", "-x", "1024", "-y", "1024", "-aa", "0.06",
            "-ab", "3", "-ad", "512", "-as", "256", "-ar", "128", "-ps", "2", "-pt", "0.1", "-lr",
            "12", "-lw", "0.001", "-i", "-af", "image/s_plan_L00.amb", "octree/s.oct",
        ]
    );
    assert_eq!(
        spec.stdout,
        StdoutTarget::File(PathBuf::from("image/s_plan_L00.hdr"))
    );
    assert_eq!(spec.envs.len(), 1);
    assert!(spec.produces.is_empty());
}

#[test]
fn overture_is_small_and_halved() {
    let spec = call("draft").overture_spec();
    let args = args_of(&spec);
    let value = |flag: &str| {
        let i = args.iter().position(|a| a == flag).unwrap();
        args[i + 1].clone()
    };
    assert_eq!(value("-x"), "64");
    assert_eq!(value("-y"), "64");
    assert_eq!(value("-ad"), "1024");
    assert_eq!(value("-as"), "512");
    assert_eq!(value("-ar"), "1024");
    assert!(spec.has_arg("-dj"));
    assert_eq!(spec.stdout, StdoutTarget::Null);
    assert_eq!(spec.produces, vec![PathBuf::from("image/s_plan_L00.amb")]);
}

#[test]
fn direct_flags_sit_before_ambient_file() {
    let args = args_of(&call("prod").main_spec(Path::new("x.hdr")));
    let dp = args.iter().position(|a| a == "-dp").unwrap();
    let i = args.iter().position(|a| a == "-i").unwrap();
    assert!(dp < i);
    assert_eq!(args.last().unwrap(), "octree/s.oct");
}

#[test]
fn direct_sun_pass_has_no_ambient_cache() {
    let spec = direct_sun_spec(
        Path::new("rpict"),
        Path::new("view/plan_L00.vp"),
        512,
        3,
        Path::new("octree/tower_with_site_SS_0621_1200.oct"),
        Path::new("image/sun.hdr"),
        &[],
    );
    assert_eq!(
        args_of(&spec),
        [
            "-w", "-t", "3", "-vf", "view/plan_L00.vp", "-x", "512", "-y", "512", "-ab", "0",
            "-ad", "128", "-ar", "64", "-as", "64", "-ps", "2", "-lw", "0.005",
            "octree/tower_with_site_SS_0621_1200.oct",
        ]
    );
    assert!(!spec.has_arg("-af"));
    assert_eq!(spec.stdout, StdoutTarget::File(PathBuf::from("image/sun.hdr")));
}
