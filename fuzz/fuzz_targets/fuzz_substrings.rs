#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    line: &'a str,
    min_len: u8,
}

fuzz_target!(|input: Input| {
    // Enumeration must never split a character or exceed the window count
    let min_len = (input.min_len as usize).max(1);
    for word in subdex::utils::split_words(input.line) {
        let mut count = 0;
        for sub in subdex::utils::substrings(word, min_len) {
            assert!(sub.len() >= min_len);
            assert!(word.contains(sub));
            count += 1;
        }
        assert!(count <= subdex::utils::substring_window_count(word.len(), min_len));
    }
});
