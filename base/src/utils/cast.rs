
use crate::vkchar;

use std::ffi::{ CStr, CString };

/// Helper function to convert [c_char; SIZE] to string.
///
/// Invalid UTF-8 sequences are replaced rather than reported.
pub fn chars2string(raw_string_array: &[vkchar]) -> String {

    let raw_string = unsafe {
        let pointer = raw_string_array.as_ptr();
        CStr::from_ptr(pointer)
    };

    raw_string.to_string_lossy().into_owned()
}

pub fn cstrings2ptrs(raw_string_array: &[CString]) -> Vec<*const vkchar> {

    raw_string_array.iter()
        .map(|l| l.as_ptr()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_array_to_string() {

        let mut raw = [0 as vkchar; 16];
        for (i, b) in b"llvmpipe".iter().enumerate() {
            raw[i] = *b as vkchar;
        }

        assert_eq!(chars2string(&raw), "llvmpipe");
    }
}
