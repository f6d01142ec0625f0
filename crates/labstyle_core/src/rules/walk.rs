//! Item traversal shared by file rules.

use syn::{ImplItem, Item, Signature, TraitItem};

/// Visits `items` and the items of every inline module below them.
pub(crate) fn for_each_item<'a>(items: &'a [Item], visit: &mut dyn FnMut(&'a Item)) {
    for item in items {
        visit(item);
        if let Item::Mod(module) = item {
            if let Some((_, inner)) = &module.content {
                for_each_item(inner, visit);
            }
        }
    }
}

/// Signatures of free functions, impl methods and trait methods.
pub(crate) fn signatures<'a>(items: &'a [Item]) -> Vec<&'a Signature> {
    let mut found = Vec::new();
    for_each_item(items, &mut |item: &'a Item| match item {
        Item::Fn(function) => found.push(&function.sig),
        Item::Impl(block) => found.extend(block.items.iter().filter_map(|member| match member {
            ImplItem::Fn(method) => Some(&method.sig),
            _ => None,
        })),
        Item::Trait(definition) => {
            found.extend(definition.items.iter().filter_map(|member| match member {
                TraitItem::Fn(method) => Some(&method.sig),
                _ => None,
            }))
        }
        _ => {}
    });
    found
}
