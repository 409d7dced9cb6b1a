use rollplan_core::naming::safe_concat_name;

#[test]
fn shortens_to_kubernetes_name_limit() {
    let input = [
        "very", "long", "name", "to", "test", "shortening", "behavior", "this", "should",
        "exceed", "max", "k8s", "name", "length",
    ];
    let out = safe_concat_name(63, &input);
    assert_eq!(out, "very-long-name-to-test-shortening-behavior-this-should-ex-e8118");
    assert_eq!(out.len(), 63);
}

#[test]
fn shortens_to_release_name_limit() {
    let input = [
        "long", "cluster", "name", "testing", "managed", "system-upgrade", "controller",
        "fleet", "agent",
    ];
    assert_eq!(
        safe_concat_name(53, &input),
        "long-cluster-name-testing-managed-system-upgrad-0beef"
    );
}

#[test]
fn limit_below_hash_size_truncates_without_hash() {
    assert_eq!(safe_concat_name(3, &["this", "will", "not", "be", "hashed"]), "thi");
}

#[test]
fn short_names_are_joined_unchanged() {
    assert_eq!(
        safe_concat_name(90, &["simple", "concat", "no", "hash", "needed"]),
        "simple-concat-no-hash-needed"
    );
}

#[test]
fn zero_limit_yields_empty_name() {
    assert_eq!(safe_concat_name(0, &["input"]), "");
}

#[test]
fn limit_equal_to_hash_size_yields_bare_hash() {
    assert_eq!(safe_concat_name(6, &["input", "s"]), "deab5");
}

#[test]
fn trailing_symbol_absorbs_separator() {
    assert_eq!(safe_concat_name(8, &["a", "&", "b", "=", "c"]), "a-359087");
}
