//! Group-based ordering check used by `field-order` and `param-order`.

use crate::config::{classify, CompiledGroup};
use crate::model::finding::{Location, Violation};

pub(crate) struct OrderedItem {
    pub name: String,
    pub type_text: String,
    pub location: Location,
}

/// Reports the first item that belongs to an earlier group than an item
/// before it. The suggestion is the stable sort of constrained items.
pub(crate) fn check_order(
    groups: &[CompiledGroup],
    items: &[OrderedItem],
    noun: &str,
    subject: &str,
) -> Option<Violation> {
    let classified = items
        .iter()
        .filter_map(|item| classify(groups, &item.name, &item.type_text).map(|group| (group, item)))
        .collect::<Vec<_>>();

    let mut highest = 0;
    let mut offender = None;
    for (position, (group, item)) in classified.iter().enumerate() {
        if *group < highest {
            offender = Some((position, *group, *item));
            break;
        }
        highest = *group;
    }

    let (position, group, item) = offender?;
    let (top, earlier) = classified[..position]
        .iter()
        .find(|(earlier_group, _)| *earlier_group > group)
        .copied()?;
    let mut expected = classified.clone();
    expected.sort_by_key(|(group, _)| *group);
    let expected = expected
        .iter()
        .map(|(_, item)| item.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    Some(
        Violation::new(
            item.location.clone(),
            format!(
                "{noun} `{}` ({}) should come before `{}` ({}) in {subject}",
                item.name, groups[group].name, earlier.name, groups[top].name
            ),
        )
        .with_suggestion(format!("order {noun}s as: {expected}")),
    )
}
