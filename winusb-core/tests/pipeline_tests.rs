//! End-to-end runs of the writer against the recording HAL.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;
use winusb_core::boot_mode::BootMode;
use winusb_core::config::{Config, MountConfig};
use winusb_core::errors::is_user_abort;
use winusb_core::prompt::{Answer, ScriptedPrompter};
use winusb_core::writer::{run, WriterConfig};
use winusb_hal::{BlockDevice, FakeHal, MountOps, MountOptions, Operation};

struct Fixture {
    tmp: TempDir,
    cfg: WriterConfig,
}

impl Fixture {
    fn mount(&self, name: &str) -> PathBuf {
        self.tmp.path().join("mnt").join(name)
    }

    fn mounts(&self) -> Vec<PathBuf> {
        ["iso", "boot", "install"]
            .iter()
            .map(|m| self.mount(m))
            .collect()
    }
}

fn put(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A Windows 11 ISO, "mounted" by pre-populating the ISO mount point.
fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let iso = tmp.path().join("Win11_23H2_English_x64.iso");
    fs::write(&iso, b"not really an iso").unwrap();

    let iso_root = tmp.path().join("mnt/iso");
    put(&iso_root, "bootmgr", b"bootmgr");
    put(&iso_root, "EFI/Boot/bootx64.efi", b"efi loader");
    put(&iso_root, "sources/boot.wim", b"winpe");
    put(&iso_root, "sources/install.wim", b"the big one");
    put(&iso_root, "sources/idwbinfo.txt", b"[BUILDINFO]\nBuildString=22631.2428.amd64fre\n");

    let config = Config {
        iso_dir: tmp.path().to_path_buf(),
        mounts: MountConfig {
            iso: iso_root,
            boot: tmp.path().join("mnt/boot"),
            install: tmp.path().join("mnt/install"),
        },
        settle_delay_secs: 0,
        ..Config::default()
    };
    let cfg = WriterConfig {
        iso: Some(iso),
        mode: Some(BootMode::Uefi),
        device: Some("sdb".to_string()),
        assume_yes: true,
        ..WriterConfig::new(config)
    };
    Fixture { tmp, cfg }
}

fn hal() -> FakeHal {
    FakeHal::new().with_block_device("/dev/sdb").with_mirroring()
}

fn unmounts_of(hal: &FakeHal, target: &Path) -> usize {
    hal.operations()
        .iter()
        .filter(|op| matches!(op, Operation::Unmount { target: t } if t == target))
        .count()
}

fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}

#[test]
fn successful_run_tears_down_in_order() {
    let fx = fixture();
    let hal = hal();
    run(&fx.cfg, &hal, &ScriptedPrompter::new([])).expect("write should succeed");

    let kinds: Vec<&str> = hal.operations().iter().map(|op| op.kind()).collect();
    assert_eq!(kinds.last(), Some(&"power_off"));

    let first_sync = kinds.iter().position(|k| *k == "sync").unwrap();
    assert_eq!(kinds[first_sync + 1], "sync");
    assert!(kinds[first_sync + 2..first_sync + 5].iter().all(|k| *k == "unmount"));
    assert_eq!(kinds[first_sync + 5], "losetup_detach");

    for mount in fx.mounts() {
        assert_eq!(unmounts_of(&hal, &mount), 1, "{}", mount.display());
    }
    assert!(hal.has_operation(|op| matches!(
        op,
        Operation::Mount { fstype: Some(t), read_only: true, .. } if t == "udf"
    )));
    assert!(hal.has_operation(|op| matches!(
        op,
        Operation::Mount { fstype: Some(t), .. } if t == "ntfs3"
    )));
}

#[test]
fn boot_partition_gets_boot_wim_but_not_install_image() {
    let fx = fixture();
    run(&fx.cfg, &hal(), &ScriptedPrompter::new([])).unwrap();

    let boot = fx.mount("boot");
    assert_eq!(fs::read(boot.join("sources/boot.wim")).unwrap(), b"winpe");
    assert!(boot.join("EFI/Boot/bootx64.efi").is_file());
    assert!(!boot.join("sources/install.wim").exists());
    assert!(fx.mount("install").join("sources/install.wim").is_file());
}

#[test]
fn failure_after_partitioning_unmounts_each_mount_point_once() {
    for failing in ["format_vfat", "rsync", "mount:vfat"] {
        let fx = fixture();
        let hal = hal().failing(failing);
        let err = run(&fx.cfg, &hal, &ScriptedPrompter::new([])).unwrap_err();
        assert!(!is_user_abort(&err), "{}: {:#}", failing, err);

        for mount in fx.mounts() {
            assert_eq!(unmounts_of(&hal, &mount), 1, "{} / {}", failing, mount.display());
        }
        assert!(hal.has_operation(|op| matches!(op, Operation::LosetupDetach { .. })));
        assert!(!hal.has_operation(|op| matches!(op, Operation::PowerOff { .. })));
    }
}

#[test]
fn partprobe_failure_still_unmounts_each_mount_point_once() {
    let fx = fixture();
    let hal = hal().failing("partprobe");
    let err = run(&fx.cfg, &hal, &ScriptedPrompter::new([])).unwrap_err();
    assert!(format!("{:#}", err).contains("partprobe"));

    for mount in fx.mounts() {
        assert_eq!(unmounts_of(&hal, &mount), 1, "{}", mount.display());
    }
    assert!(!hal.has_operation(|op| matches!(op, Operation::LosetupAttach { .. })));
    assert!(!hal.has_operation(|op| matches!(op, Operation::PowerOff { .. })));
}

#[test]
fn iso_mount_falls_back_to_iso9660() {
    let fx = fixture();
    let hal = hal().failing("mount:udf");
    run(&fx.cfg, &hal, &ScriptedPrompter::new([])).unwrap();
    assert!(hal.has_operation(|op| matches!(
        op,
        Operation::Mount { fstype: Some(t), .. } if t == "iso9660"
    )));
}

#[test]
fn rerun_is_idempotent() {
    let fx = fixture();
    let hal = hal();
    run(&fx.cfg, &hal, &ScriptedPrompter::new([])).unwrap();
    let boot_before = snapshot(&fx.mount("boot"));
    let install_before = snapshot(&fx.mount("install"));

    put(&fx.mount("boot"), "stale/old.txt", b"left over");
    put(&fx.mount("install"), "autorun.inf", b"left over");
    run(&fx.cfg, &hal, &ScriptedPrompter::new([])).unwrap();

    assert_eq!(snapshot(&fx.mount("boot")), boot_before);
    assert_eq!(snapshot(&fx.mount("install")), install_before);
}

#[test]
fn dry_run_touches_nothing() {
    let mut fx = fixture();
    fx.cfg.dry_run = true;
    let hal = hal();
    run(&fx.cfg, &hal, &ScriptedPrompter::new([])).unwrap();

    let destructive = [
        "wipefs",
        "parted",
        "partprobe",
        "format_vfat",
        "format_ntfs",
        "mount",
        "unmount",
        "losetup_attach",
        "power_off",
    ];
    for op in hal.operations() {
        assert!(!destructive.contains(&op.kind()), "unexpected {:?}", op);
    }
    assert!(!fx.mount("boot").join("sources").exists());
}

#[test]
fn mbr_mode_uses_msdos_label() {
    let mut fx = fixture();
    fx.cfg.mode = Some(BootMode::Mbr);
    let hal = hal();
    run(&fx.cfg, &hal, &ScriptedPrompter::new([])).unwrap();

    let parted: Vec<String> = hal
        .operations()
        .into_iter()
        .filter_map(|op| match op {
            Operation::Parted { op, .. } => Some(op),
            _ => None,
        })
        .collect();
    assert!(parted[0].contains("msdos"));
    assert!(parted[2].contains("\"boot\""));
}

#[test]
fn missing_boot_files_can_abort_the_run() {
    let mut fx = fixture();
    fx.cfg.assume_yes = false;
    fs::remove_file(fx.mount("iso").join("EFI/Boot/bootx64.efi")).unwrap();
    let hal = hal();
    let prompter = ScriptedPrompter::new([Answer::Enter, Answer::Confirm(false)]);

    let err = run(&fx.cfg, &hal, &prompter).unwrap_err();
    assert!(is_user_abort(&err));
    for mount in fx.mounts() {
        assert_eq!(unmounts_of(&hal, &mount), 1);
    }
    assert_eq!(prompter.remaining(), 0);
}

#[test]
fn interactive_selection() {
    let mut fx = fixture();
    fs::write(fx.tmp.path().join("a_first.iso"), b"").unwrap();
    fx.cfg.iso = None;
    fx.cfg.mode = None;
    fx.cfg.device = None;
    fx.cfg.assume_yes = false;
    let hal = hal().with_disks(vec![BlockDevice::disk("sdb", "28.9G")]);
    let prompter = ScriptedPrompter::new([
        Answer::Input("1".into()),
        Answer::Input("2".into()),
        Answer::Input("sdb".into()),
        Answer::Enter,
    ]);

    run(&fx.cfg, &hal, &prompter).unwrap();
    assert_eq!(prompter.remaining(), 0);
    assert!(hal.has_operation(|op| matches!(
        op,
        Operation::LosetupAttach { image, read_only: true, .. }
            if image.ends_with("Win11_23H2_English_x64.iso")
    )));
    assert!(hal.has_operation(|op| matches!(
        op,
        Operation::Parted { op, .. } if op.contains("msdos")
    )));
}

#[test]
fn stale_mount_from_earlier_run_is_released_first() {
    let fx = fixture();
    let hal = hal();
    hal.mount_device(
        Path::new("/dev/sdb1"),
        &fx.mount("boot"),
        Some("vfat"),
        MountOptions::new(),
        false,
    )
    .unwrap();

    run(&fx.cfg, &hal, &ScriptedPrompter::new([])).unwrap();

    let ops = hal.operations();
    let first_unmount = ops
        .iter()
        .position(|op| matches!(op, Operation::Unmount { .. }))
        .unwrap();
    let wipe = ops
        .iter()
        .position(|op| matches!(op, Operation::WipeFsAll { .. }))
        .unwrap();
    assert!(first_unmount < wipe);
    assert_eq!(unmounts_of(&hal, &fx.mount("boot")), 2);
    assert_eq!(unmounts_of(&hal, &fx.mount("install")), 1);
}

#[test]
fn invalid_device_stops_before_anything_destructive() {
    let mut fx = fixture();
    fx.cfg.device = Some("sdz".into());
    let hal = hal();
    assert!(run(&fx.cfg, &hal, &ScriptedPrompter::new([])).is_err());
    assert!(!hal.has_operation(|op| matches!(op, Operation::WipeFsAll { .. })));
}
