//! Declarative builder for permission tree nodes.

/// Declare a permission node.
///
/// ```ignore
/// permission_node! {
///     /// Dataset actions.
///     pub struct DatasetPermission [at_least_one] {
///         optional: { ACTION_READ: Allow, ACTION_TAG: Allow }
///         required: {}
///     }
/// }
/// ```
///
/// `at_least_one` rejects a node whose optional fields are all null;
/// `lenient` skips that check. The generated struct rejects unknown keys
/// and implements [`PermissionNode`](crate::permission::PermissionNode).
macro_rules! permission_node {
    (@guard at_least_one, $node:ident, $path:ident, [$($opt:ident),*]) => {
        if true $(&& $node.$opt.is_none())* {
            let fields: Vec<String> = [$(stringify!($opt)),*]
                .iter()
                .map(|f| format!("'{f}'"))
                .collect();
            return Err($crate::permission::PermissionSchemaError::EmptyNode {
                path: $path.join("."),
                fields: fields.join(", "),
            });
        }
    };

    (@guard lenient, $node:ident, $path:ident, [$($opt:ident),*]) => {};

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident [$policy:ident] {
            optional: { $($opt:ident : $opt_ty:ty),* $(,)? }
            required: { $($req:ident : $req_ty:ty),* $(,)? }
        }
    ) => {
        $(#[$meta])*
        #[allow(non_snake_case)]
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(deny_unknown_fields)]
        $vis struct $name {
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $opt: Option<$opt_ty>,
            )*
            $(
                pub $req: $req_ty,
            )*
        }

        impl $crate::permission::PermissionNode for $name {
            fn create() -> Self {
                Self {
                    $( $opt: Some(<$opt_ty as $crate::permission::PermissionNode>::create()), )*
                    $( $req: <$req_ty as $crate::permission::PermissionNode>::create(), )*
                }
            }

            fn validate_at(
                &self,
                path: &mut Vec<&'static str>,
            ) -> Result<(), $crate::permission::PermissionSchemaError> {
                let node = self;
                permission_node!(@guard $policy, node, path, [$($opt),*]);
                $(
                    if let Some(child) = &node.$opt {
                        path.push(stringify!($opt));
                        $crate::permission::PermissionNode::validate_at(child, path)?;
                        path.pop();
                    }
                )*
                $(
                    path.push(stringify!($req));
                    $crate::permission::PermissionNode::validate_at(&node.$req, path)?;
                    path.pop();
                )*
                Ok(())
            }
        }
    };
}

pub(crate) use permission_node;
