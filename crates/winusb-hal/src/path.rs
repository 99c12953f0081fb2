/// Partition path helper for block devices.
///
/// Devices whose name ends in a digit (nvme, mmcblk, loop) get a `p` infix, everything else
/// takes the number directly (`/dev/sdb` -> `/dev/sdb1`).
pub fn partition_path(disk: &str, num: u32) -> String {
    let ends_with_digit = disk.chars().last().is_some_and(|c| c.is_ascii_digit());
    if ends_with_digit || disk.contains("nvme") || disk.contains("mmcblk") {
        format!("{}p{}", disk, num)
    } else {
        format!("{}{}", disk, num)
    }
}
