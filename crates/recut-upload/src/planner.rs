//! Byte-range planning.
//!
//! Pure functions of file size choosing chunk size and upload parallelism.
//! The threshold ordering is load-bearing: the backend derives its part
//! expectations from the same table, so the tiers must partition the size
//! domain exactly as written.

const MIB: u64 = 1024 * 1024;

/// Chunk size for multipart uploads, tiered by file size.
pub fn chunk_size(file_size_bytes: u64) -> u64 {
    match file_size_bytes {
        s if s >= 2048 * MIB => 32 * MIB,
        s if s >= 1024 * MIB => 24 * MIB,
        s if s >= 512 * MIB => 16 * MIB,
        s if s >= 256 * MIB => 12 * MIB,
        _ => 8 * MIB,
    }
}

/// Part-upload parallelism, tiered by file size.
///
/// The orchestrator currently uploads parts sequentially; this factor is the
/// declared capacity model for a future concurrent uploader and is exposed
/// so the two stay in one place.
pub fn parallelism(file_size_bytes: u64) -> u32 {
    match file_size_bytes {
        s if s >= 1024 * MIB => 4,
        s if s >= 512 * MIB => 3,
        s if s >= 256 * MIB => 2,
        _ => 1,
    }
}

/// Number of parts a file splits into at the given part size.
pub fn part_count(file_size_bytes: u64, part_size_bytes: u64) -> u64 {
    if part_size_bytes == 0 {
        return 0;
    }
    file_size_bytes.div_ceil(part_size_bytes)
}

/// Infer the MIME type for an upload from its filename.
pub fn content_type_for(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".mp4") || lower.ends_with(".m4v") {
        "video/mp4"
    } else if lower.ends_with(".mov") {
        "video/quicktime"
    } else if lower.ends_with(".webm") {
        "video/webm"
    } else if lower.ends_with(".mkv") {
        "video/x-matroska"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_size_tiers() {
        assert_eq!(chunk_size(0), 8 * MIB);
        assert_eq!(chunk_size(256 * MIB - 1), 8 * MIB);
        assert_eq!(chunk_size(256 * MIB), 12 * MIB);
        assert_eq!(chunk_size(512 * MIB), 16 * MIB);
        assert_eq!(chunk_size(1024 * MIB), 24 * MIB);
        assert_eq!(chunk_size(2048 * MIB), 32 * MIB);
        assert_eq!(chunk_size(10 * 1024 * 1024 * MIB), 32 * MIB);
    }

    #[test]
    fn test_parallelism_tiers() {
        assert_eq!(parallelism(0), 1);
        assert_eq!(parallelism(256 * MIB - 1), 1);
        assert_eq!(parallelism(256 * MIB), 2);
        assert_eq!(parallelism(512 * MIB), 3);
        assert_eq!(parallelism(1024 * MIB), 4);
        assert_eq!(parallelism(8192 * MIB), 4);
    }

    #[test]
    fn test_step_functions_are_non_decreasing() {
        let mut last_chunk = 0;
        let mut last_par = 0;
        for mib in (0..4096).step_by(16) {
            let size = mib * MIB;
            let chunk = chunk_size(size);
            let par = parallelism(size);
            assert!(chunk >= last_chunk, "chunk regressed at {} MiB", mib);
            assert!(par >= last_par, "parallelism regressed at {} MiB", mib);
            last_chunk = chunk;
            last_par = par;
        }
    }

    #[test]
    fn test_part_count() {
        // 300 MiB at the backend's 8 MiB part size splits into 38 parts
        assert_eq!(part_count(300 * MIB, 8 * MIB), 38);
        assert_eq!(part_count(8 * MIB, 8 * MIB), 1);
        assert_eq!(part_count(8 * MIB + 1, 8 * MIB), 2);
        assert_eq!(part_count(100, 0), 0);
    }

    #[test]
    fn test_content_type_inference() {
        assert_eq!(content_type_for("Clip.MP4"), "video/mp4");
        assert_eq!(content_type_for("raw.mov"), "video/quicktime");
        assert_eq!(content_type_for("take2.webm"), "video/webm");
        assert_eq!(content_type_for("export.bin"), "application/octet-stream");
    }
}
