use crate::domain::{branch, CategoryNode, CategoryTree};

/// Starter taxonomy seeded for every new account.
pub fn default_tree() -> CategoryTree {
    CategoryTree::new()
        .with(
            "Personal",
            branch([
                ("Reading_List", CategoryNode::leaf()),
                (
                    "Learning",
                    branch([
                        ("Programming", CategoryNode::leaf()),
                        ("Design", CategoryNode::leaf()),
                        ("Business", CategoryNode::leaf()),
                    ]),
                ),
                ("Tools", CategoryNode::leaf()),
                ("Inspiration", CategoryNode::leaf()),
            ]),
        )
        .with(
            "Work",
            branch([
                ("Documentation", CategoryNode::leaf()),
                ("Resources", CategoryNode::leaf()),
                ("Projects", CategoryNode::leaf()),
            ]),
        )
        .with("Archive", CategoryNode::leaf())
}
