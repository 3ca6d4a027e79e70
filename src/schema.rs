table! {
    scores (id) {
        id -> Int8,
        epoch -> Nullable<Int8>,
        vote_address -> Nullable<Varchar>,
        keybase_id -> Nullable<Varchar>,
        name -> Nullable<Varchar>,
        score -> Int8,
        avg_position -> Float8,
        commission -> Int2,
        active_stake -> Float8,
        epoch_credits -> Int8,
        data_center_concentration -> Float8,
        can_halt_the_network_group -> Bool,
        stake_state -> Varchar,
        stake_state_reason -> Varchar,
        pct -> Float8,
        stake_conc -> Float8,
        adj_credits -> Int8,
    }
}

table! {
    scores2 (id) {
        id -> Int8,
        epoch -> Int8,
        rank -> Int4,
        score -> Int8,
        name -> Varchar,
        credits_observed -> Int8,
        vote_address -> Varchar,
        commission -> Int2,
        average_position -> Float8,
        data_center_concentration -> Float8,
        avg_active_stake -> Float8,
        apy -> Nullable<Float8>,
        delinquent -> Bool,
        this_epoch_credits -> Int8,
        pct -> Float8,
        staked_amount -> Float8,
        should_have -> Float8,
        remove_level -> Int2,
        remove_level_reason -> Varchar,
        under_nakamoto_coefficient -> Bool,
        keybase_id -> Varchar,
        identity -> Varchar,
        stake_concentration -> Float8,
        base_score -> Int8,
    }
}

allow_tables_to_appear_in_same_query!(
    scores,
    scores2,
);
