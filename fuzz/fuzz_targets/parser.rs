#![no_main]

use libfuzzer_sys::fuzz_target;
use specstream_rs::parser;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string, handling invalid UTF-8 gracefully
    let input = String::from_utf8_lossy(data);

    // The parser should never panic and always return a proper Result
    let result = parser::parse(&input);

    // If parsing succeeds, verify the result is well-formed
    if let Ok(ref suites) = result {
        fn check(suite: &parser::SuiteDef) {
            assert!(suite.line_num > 0, "Invalid line number");
            for item in &suite.items {
                match item {
                    parser::SuiteItem::Suite(inner) => check(inner),
                    parser::SuiteItem::Spec(spec) => {
                        assert!(spec.line_num > 0, "Invalid line number");
                    }
                }
            }
        }
        for suite in suites {
            check(suite);
        }
    }

    // Same input must parse the same way twice
    let result2 = parser::parse(&input);
    match (&result, &result2) {
        (Ok(a), Ok(b)) => assert_eq!(a, b, "Parser is not deterministic"),
        (Err(_), Err(_)) => {}
        _ => panic!("Parser is not deterministic - one call succeeded, other failed"),
    }
});
