//! Resource kinds the generator draws from.
//!
//! Every kind is a type known to the built-in resource specification, so the
//! update behaviour of each generated property is well defined.

/// How a linked property refers to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStyle {
    /// `{"Ref": id}`
    Ref,
    /// `{"Fn::GetAtt": [id, attribute]}`
    GetAtt(&'static str),
}

/// A property that points at an earlier resource of a given type.
#[derive(Debug, Clone, Copy)]
pub struct Link {
    pub property: &'static str,
    pub target_type: &'static str,
    pub style: LinkStyle,
}

/// One generatable resource type.
#[derive(Debug, Clone, Copy)]
pub struct ResourceKind {
    pub type_name: &'static str,
    /// Prefix of generated logical IDs.
    pub id_prefix: &'static str,
    /// Immutable property holding a physical name.
    pub name_property: &'static str,
    /// Mutable property whose value is free to change.
    pub mutable_property: &'static str,
    pub links: &'static [Link],
}

const ROLE: &str = "AWS::IAM::Role";
const VPC: &str = "AWS::EC2::VPC";

pub const KINDS: &[ResourceKind] = &[
    ResourceKind {
        type_name: VPC,
        id_prefix: "Vpc",
        name_property: "CidrBlock",
        mutable_property: "Tags",
        links: &[],
    },
    ResourceKind {
        type_name: "AWS::EC2::Subnet",
        id_prefix: "Subnet",
        name_property: "CidrBlock",
        mutable_property: "Tags",
        links: &[Link {
            property: "VpcId",
            target_type: VPC,
            style: LinkStyle::Ref,
        }],
    },
    ResourceKind {
        type_name: "AWS::EC2::SecurityGroup",
        id_prefix: "SecurityGroup",
        name_property: "GroupDescription",
        mutable_property: "SecurityGroupIngress",
        links: &[Link {
            property: "VpcId",
            target_type: VPC,
            style: LinkStyle::Ref,
        }],
    },
    ResourceKind {
        type_name: ROLE,
        id_prefix: "Role",
        name_property: "RoleName",
        mutable_property: "AssumeRolePolicyDocument",
        links: &[],
    },
    ResourceKind {
        type_name: "AWS::Lambda::Function",
        id_prefix: "Function",
        name_property: "FunctionName",
        mutable_property: "Code",
        links: &[Link {
            property: "Role",
            target_type: ROLE,
            style: LinkStyle::GetAtt("Arn"),
        }],
    },
    ResourceKind {
        type_name: "AWS::ECS::TaskDefinition",
        id_prefix: "TaskDefinition",
        name_property: "Family",
        mutable_property: "Tags",
        links: &[Link {
            property: "ExecutionRoleArn",
            target_type: ROLE,
            style: LinkStyle::GetAtt("Arn"),
        }],
    },
    ResourceKind {
        type_name: "AWS::ECS::Service",
        id_prefix: "Service",
        name_property: "ServiceName",
        mutable_property: "DesiredCount",
        links: &[Link {
            property: "TaskDefinition",
            target_type: "AWS::ECS::TaskDefinition",
            style: LinkStyle::Ref,
        }],
    },
    ResourceKind {
        type_name: "AWS::SQS::Queue",
        id_prefix: "Queue",
        name_property: "QueueName",
        mutable_property: "VisibilityTimeout",
        links: &[],
    },
    ResourceKind {
        type_name: "AWS::SNS::Topic",
        id_prefix: "Topic",
        name_property: "TopicName",
        mutable_property: "DisplayName",
        links: &[],
    },
    ResourceKind {
        type_name: "AWS::S3::Bucket",
        id_prefix: "Bucket",
        name_property: "BucketName",
        mutable_property: "VersioningConfiguration",
        links: &[],
    },
    ResourceKind {
        type_name: "AWS::Route53::HostedZone",
        id_prefix: "Zone",
        name_property: "Name",
        mutable_property: "HostedZoneConfig",
        links: &[],
    },
    ResourceKind {
        type_name: "AWS::Route53::RecordSet",
        id_prefix: "Record",
        name_property: "Name",
        mutable_property: "TTL",
        links: &[Link {
            property: "HostedZoneId",
            target_type: "AWS::Route53::HostedZone",
            style: LinkStyle::Ref,
        }],
    },
];

/// Looks up the kind generated for `type_name`.
pub fn kind_for_type(type_name: &str) -> Option<&'static ResourceKind> {
    KINDS.iter().find(|k| k.type_name == type_name)
}

#[cfg(test)]
mod tests {
    use cfndiff_core::{ResourceSpecLookup, ResourceSpecification, UpdateType};

    use super::*;

    #[test]
    fn name_properties_are_immutable() {
        let spec = ResourceSpecification::builtin();
        for kind in KINDS {
            assert!(spec.knows_type(kind.type_name), "{}", kind.type_name);
            assert_eq!(
                spec.update_type(kind.type_name, kind.name_property),
                UpdateType::Immutable,
                "{}.{}",
                kind.type_name,
                kind.name_property
            );
            assert_eq!(
                spec.update_type(kind.type_name, kind.mutable_property),
                UpdateType::Mutable,
                "{}.{}",
                kind.type_name,
                kind.mutable_property
            );
        }
    }

    #[test]
    fn link_targets_are_generatable() {
        for kind in KINDS {
            for link in kind.links {
                assert!(kind_for_type(link.target_type).is_some());
            }
        }
    }
}
