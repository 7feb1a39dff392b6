use super::*;
use proptest::prelude::*;

fn collect<T: Clone>(seq: &Seq<T>) -> Vec<T> {
    seq.iter().cloned().collect()
}

#[test]
fn new_seq_is_empty_array() {
    let seq: Seq<u32> = Seq::new();
    assert_eq!(seq.repr(), Repr::Array);
    assert!(seq.is_empty());
    assert_eq!(seq.get(0), None);
}

#[test]
fn append_and_index_in_both_reprs() {
    for repr in [Repr::Array, Repr::List] {
        let mut seq = Seq::with_repr(repr);
        for i in 0..10 {
            seq.push(i * 10);
        }
        assert_eq!(seq.len(), 10);
        assert_eq!(seq.get(0), Some(&0));
        assert_eq!(seq.get(7), Some(&70));
        assert_eq!(seq.get(9), Some(&90));
        assert_eq!(seq.get(10), None);
    }
}

#[test]
fn list_remove_keeps_order() {
    let mut seq: Seq<_> = Seq::list();
    seq.extend(["a", "b", "c", "d", "e"]);

    assert_eq!(seq.remove(0), Some("a"));
    assert_eq!(seq.remove(3), Some("e"));
    assert_eq!(seq.remove(1), Some("c"));
    assert_eq!(collect(&seq), vec!["b", "d"]);
    assert_eq!(seq.remove(5), None);
}

#[test]
fn list_reuses_vacated_links() {
    let mut seq = Seq::list();
    seq.extend(0..4);
    seq.remove(1);
    seq.remove(1);
    seq.push(9);
    seq.push(10);
    assert_eq!(collect(&seq), vec![0, 3, 9, 10]);
}

#[test]
fn array_swap_remove_moves_last_into_gap() {
    let mut seq: Seq<_> = (1..=4).collect();
    assert_eq!(seq.swap_remove(0), Some(1));
    assert_eq!(collect(&seq), vec![4, 2, 3]);
    assert_eq!(seq.swap_remove(9), None);
}

#[test]
fn conversions_preserve_order() {
    let mut seq: Seq<_> = (0..6).collect();
    seq.make_list();
    assert_eq!(seq.repr(), Repr::List);
    assert_eq!(seq.as_slice(), None);
    assert_eq!(collect(&seq), vec![0, 1, 2, 3, 4, 5]);

    seq.remove(2);
    seq.make_array();
    assert_eq!(seq.repr(), Repr::Array);
    assert_eq!(seq.as_slice(), Some(&[0, 1, 3, 4, 5][..]));
}

#[test]
fn conversion_to_same_repr_is_noop() {
    let mut seq: Seq<_> = (0..3).collect();
    seq.make_array();
    assert_eq!(collect(&seq), vec![0, 1, 2]);

    seq.make_list();
    seq.make_list();
    assert_eq!(collect(&seq), vec![0, 1, 2]);
}

#[test]
fn get_mut_and_position() {
    let mut seq = Seq::list();
    seq.extend([(1, 'a'), (2, 'b'), (3, 'c')]);

    let pos = seq.position(|(k, _)| *k == 2).expect("present");
    assert_eq!(pos, 1);
    seq.get_mut(pos).expect("present").1 = 'z';
    assert_eq!(seq.get(1), Some(&(2, 'z')));
    assert_eq!(seq.position(|(k, _)| *k == 7), None);
}

#[test]
fn clear_and_equality_ignore_repr() {
    let array: Seq<_> = (0..3).collect();
    let mut list = Seq::list();
    list.extend(0..3);
    assert_eq!(array, list);

    list.clear();
    assert!(list.is_empty());
    assert_eq!(list.repr(), Repr::List);
    list.push(1);
    assert_eq!(collect(&list), vec![1]);
}

#[test]
fn into_vec_drains_in_order() {
    let mut seq = Seq::list();
    seq.extend(["x", "y", "z"]);
    seq.remove(0);
    assert_eq!(seq.into_vec(), vec!["y", "z"]);
}

#[derive(Debug, Clone)]
enum Op {
    Push(u16),
    Remove(usize),
    ToArray,
    ToList,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u16>().prop_map(Op::Push),
        (0usize..32).prop_map(Op::Remove),
        Just(Op::ToArray),
        Just(Op::ToList),
    ]
}

proptest! {
    #[test]
    fn behaves_like_vec(ops in proptest::collection::vec(op(), 0..64)) {
        let mut seq = Seq::list();
        let mut model = Vec::new();

        for op in ops {
            match op {
                Op::Push(v) => {
                    seq.push(v);
                    model.push(v);
                }
                Op::Remove(i) => {
                    let expected = if i < model.len() { Some(model.remove(i)) } else { None };
                    prop_assert_eq!(seq.remove(i), expected);
                }
                Op::ToArray => seq.make_array(),
                Op::ToList => seq.make_list(),
            }
            prop_assert_eq!(seq.len(), model.len());
        }

        prop_assert_eq!(collect(&seq), model);
    }
}
