table! {
    bitcoinabuse_address (address) {
        address -> Text,
        reports -> Jsonb,
        added_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    chainabuse_report (id) {
        id -> Text,
        report -> Jsonb,
        added_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    walletexplorer_label (address, name, kind, source) {
        address -> Text,
        name -> Text,
        kind -> Text,
        source -> Text,
        added_at -> Timestamptz,
    }
}

allow_tables_to_appear_in_same_query!(
    bitcoinabuse_address,
    chainabuse_report,
    walletexplorer_label,
);
