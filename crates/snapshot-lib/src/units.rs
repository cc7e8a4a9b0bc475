//! Canonical unit conversion for compute-capacity strings
//!
//! kubectl reports CPU in whole cores or millicores and memory in a mix of
//! decimal and binary suffixes. Everything is normalized to millicores and
//! mebibytes here. Unparsable input yields zero rather than an error,
//! matching kubectl's own tolerant reporting posture.

/// Convert a CPU quantity ("130m", "1", "0.5", "1.64") to millicores.
///
/// A trailing `m` means the value is already in millicores; otherwise the
/// value is a decimal number of whole cores.
pub fn cpu_to_milli(cpu: &str) -> i64 {
    if let Some(milli) = cpu.strip_suffix('m') {
        return milli.parse().unwrap_or(0);
    }
    cpu.parse::<f64>()
        .map(|cores| (cores * 1000.0) as i64)
        .unwrap_or(0)
}

/// Convert a memory quantity ("123Mi", "129M", "1Gi", "125952Ki", raw bytes)
/// to mebibytes.
///
/// The leading digit run is the value; the remainder is the unit suffix. Any
/// suffix outside the conversion table is treated as the no-suffix (raw
/// bytes) case.
pub fn memory_to_mebi(memory: &str) -> i64 {
    let digits_end = memory
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(memory.len());
    let value: i64 = memory[..digits_end].parse().unwrap_or(0);
    match &memory[digits_end..] {
        "G" => (value as f64 * 953.674_316_406_25).round() as i64,
        "Gi" => value * 1024,
        "M" => (value as f64 * 0.9537).round() as i64,
        "Mi" => value,
        "Ki" => (value as f64 / 1024.0).round() as i64,
        _ => (value as f64 * 9.53674e-7).round() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_millicore_suffix_passes_through() {
        assert_eq!(cpu_to_milli("130m"), 130);
    }

    #[test]
    fn cpu_whole_cores_scale_by_a_thousand() {
        assert_eq!(cpu_to_milli("1"), 1000);
        assert_eq!(cpu_to_milli("0.5"), 500);
        assert_eq!(cpu_to_milli("1.64"), 1640);
    }

    #[test]
    fn cpu_unparsable_defaults_to_zero() {
        assert_eq!(cpu_to_milli(""), 0);
        assert_eq!(cpu_to_milli("abc"), 0);
        assert_eq!(cpu_to_milli("xm"), 0);
    }

    #[test]
    fn memory_conversion_table() {
        assert_eq!(memory_to_mebi("123Mi"), 123);
        assert_eq!(memory_to_mebi("129M"), 123);
        assert_eq!(memory_to_mebi("128974848"), 123);
        assert_eq!(memory_to_mebi("125952Ki"), 123);
        assert_eq!(memory_to_mebi("1Gi"), 1024);
        assert_eq!(memory_to_mebi("2G"), 1907);
    }

    #[test]
    fn memory_unknown_suffix_is_raw_bytes() {
        assert_eq!(memory_to_mebi("128974848Xyz"), 123);
        assert_eq!(memory_to_mebi(""), 0);
    }
}
