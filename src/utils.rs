/// Cartesian product of an arbitrary number of lists.
///
/// ```text
/// [[a, b], [c], [d, e]] -> [[a, c, d], [a, c, e], [b, c, d], [b, c, e]]
/// ```
///
/// The product is accumulated with a fold, one list at a time, so the depth
/// of the computation does not grow with the number of lists. The product of
/// no lists is a single empty tuple; the product involving an empty list is
/// empty. Tuples are ordered lexicographically by input position.
///
/// # Examples
///
/// ```
/// use tioa::utils::cartesian_product;
///
/// let p = cartesian_product(&[vec![1, 2], vec![3]]);
/// assert_eq!(p, vec![vec![1, 3], vec![2, 3]]);
/// ```
pub fn cartesian_product<T: Clone>(lists: &[Vec<T>]) -> Vec<Vec<T>> {
    lists.iter().fold(vec![Vec::with_capacity(lists.len())], |acc, list| {
        acc.iter()
            .flat_map(|prefix| {
                list.iter().map(move |item| {
                    let mut tuple = prefix.clone();
                    tuple.push(item.clone());
                    tuple
                })
            })
            .collect()
    })
}
